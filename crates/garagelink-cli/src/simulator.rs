//! In-process controller simulator.
//!
//! Plays the far end of the mock serial link: decodes the driver's
//! frames, acknowledges switch commands, answers status queries, and
//! emits the position reports a real door would during travel. Useful
//! for demos and for exercising the stack without hardware.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use garagelink_core::{DoorPosition, SwitchKind};
use garagelink_hardware::mock::MockSerialHandle;
use garagelink_protocol::{InboundMessage, OutboundCommand, StreamEvent, StreamParser};

/// How long simulated door travel takes end to end.
const TRAVEL_TIME: Duration = Duration::from_millis(1500);

/// Delay before the first moving-position report after an ack.
const REPORT_DELAY: Duration = Duration::from_millis(100);

/// Run the simulated controller until the wire handle is the last one.
pub async fn run(wire: MockSerialHandle) {
    let mut parser = StreamParser::new();
    let mut position = DoorPosition::Closed;
    let mut scheduled: VecDeque<(Instant, InboundMessage)> = VecDeque::new();
    let mut interval = tokio::time::interval(Duration::from_millis(10));

    info!("controller simulator started, door closed");

    loop {
        interval.tick().await;
        let now = Instant::now();

        parser.feed(&wire.drain_written());
        while let Some(event) = parser.next_event() {
            let StreamEvent::Frame(frame) = event else {
                continue;
            };
            let Ok(cmd) = OutboundCommand::try_from(&frame) else {
                continue;
            };

            match cmd {
                OutboundCommand::SetSwitch { switch, value, seq } => {
                    debug!(%switch, value, seq, "simulator acking command");
                    wire.inject(
                        &InboundMessage::Ack { switch, value, seq }
                            .to_frame()
                            .to_wire(),
                    );

                    if switch == SwitchKind::Door {
                        scheduled.clear();
                        let (moving, settled) = if value {
                            (DoorPosition::Opening, DoorPosition::Open)
                        } else {
                            (DoorPosition::Closing, DoorPosition::Closed)
                        };
                        scheduled.push_back((now + REPORT_DELAY, InboundMessage::Position(moving)));
                        scheduled
                            .push_back((now + TRAVEL_TIME, InboundMessage::Position(settled)));
                    }
                }
                OutboundCommand::QueryStatus => {
                    wire.inject(&InboundMessage::Position(position).to_frame().to_wire());
                }
            }
        }

        while let Some(&(due, msg)) = scheduled.front() {
            if due > now {
                break;
            }
            scheduled.pop_front();
            if let InboundMessage::Position(p) = msg {
                position = p;
                info!(position = %p, "simulated door moved");
            }
            wire.inject(&msg.to_frame().to_wire());
        }
    }
}
