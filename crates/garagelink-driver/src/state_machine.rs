//! Garage door controller state machine.
//!
//! This module provides the synchronous core of the driver: it tracks the
//! door position and the three controller switches, pairs outgoing
//! commands with acknowledgments by sequence number, and enforces the
//! timeout/retransmit policy. It performs no I/O of its own; the caller
//! feeds it decoded messages and a clock, and drains queued outbound
//! commands and state-change events. That separation keeps every timing
//! scenario testable with a hand-rolled clock.
//!
//! # Command Lifecycle
//!
//! ```text
//! request_switch ──> pending (seq N) ──ack seq N──> confirmed
//!        │                │
//!        │                ├─ timeout ──> retransmit (same seq, bounded)
//!        │                └─ retries exhausted ──> SwitchCommandFailed
//!        └─ new request while pending ──> superseded (fresh seq)
//! ```
//!
//! Acks are matched strictly by switch and sequence number, so a late ack
//! for a superseded command is dropped instead of confirming the wrong
//! value.
//!
//! # Position Tracking
//!
//! Position comes from controller reports. When a door command is
//! acknowledged before any report arrives, the machine infers `Opening`
//! or `Closing` as an interim state; a report received between send and
//! ack suppresses the inference so a real observation is never
//! overwritten by a guess.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, warn};

use garagelink_core::{DoorPosition, Error, Result, SwitchKind};
use garagelink_protocol::{InboundMessage, OutboundCommand};
use serde::{Deserialize, Serialize};

use crate::config::DriverConfig;

/// Outcome of a switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A new command was queued for transmission.
    Sent,

    /// The switch is already confirmed at the requested value; nothing
    /// was sent.
    AlreadyConfirmed,

    /// A command for this exact value is already in flight; nothing new
    /// was sent.
    AlreadyPending,

    /// An in-flight command for the opposite value was replaced by a
    /// fresh one.
    Superseded,
}

/// State changes surfaced to entity adapters and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverEvent {
    /// The controller acknowledged a switch command.
    SwitchConfirmed { switch: SwitchKind, value: bool },

    /// A switch command was abandoned after exhausting retransmissions.
    ///
    /// `confirmed` carries the last state the controller actually
    /// acknowledged, so adapters can roll their display back instead of
    /// showing the value that never took effect.
    SwitchCommandFailed {
        switch: SwitchKind,
        requested: bool,
        confirmed: Option<bool>,
    },

    /// The tracked door position changed (report or inference).
    PositionChanged { position: DoorPosition },

    /// The door crossed the open/closed boundary as seen by the eye
    /// sensor mapping (`Open` or `Opening` counts as open).
    DoorOpenChanged { open: bool },

    /// The controller reported a fault code.
    Fault { code: u8 },
}

/// A command awaiting acknowledgment.
#[derive(Debug, Clone, Copy)]
struct PendingCommand {
    /// Value the command carries.
    value: bool,

    /// Sequence number the ack must echo.
    seq: u8,

    /// When the original request was made; survives supersede so the
    /// overall wait is measured from the user's first action.
    since: Instant,

    /// When the most recent copy went out; drives the retransmit timer.
    last_sent: Instant,

    /// Retransmissions performed so far.
    retries: u8,

    /// Report generation at send time; position inference on ack is
    /// suppressed if a report arrived in between.
    generation_at_send: u64,
}

/// Tracked state of one controller switch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchState {
    /// Last value the user asked for.
    requested: bool,

    /// Last value the controller acknowledged; `None` until the first
    /// ack or status report.
    confirmed: Option<bool>,

    /// In-flight command, if any.
    pending: Option<PendingCommand>,
}

impl SwitchState {
    /// Last requested value.
    #[must_use]
    pub fn requested(&self) -> bool {
        self.requested
    }

    /// Last controller-acknowledged value.
    #[must_use]
    pub fn confirmed(&self) -> Option<bool> {
        self.confirmed
    }

    /// Whether a command is awaiting acknowledgment.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }
}

/// Serializable point-in-time view of one switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchSnapshot {
    pub requested: bool,
    pub confirmed: Option<bool>,
    pub in_flight: bool,
}

/// Serializable point-in-time view of the whole device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverSnapshot {
    pub position: DoorPosition,
    pub door_open: bool,
    pub last_fault: Option<u8>,
    pub door: SwitchSnapshot,
    pub light: SwitchSnapshot,
    pub lock: SwitchSnapshot,
}

impl DriverSnapshot {
    /// Snapshot of the given switch.
    #[must_use]
    pub fn switch(&self, kind: SwitchKind) -> &SwitchSnapshot {
        match kind {
            SwitchKind::Door => &self.door,
            SwitchKind::Light => &self.light,
            SwitchKind::Lock => &self.lock,
        }
    }
}

/// Synchronous garage door controller state machine.
///
/// Owns no I/O. Outbound commands accumulate in an internal queue drained
/// with [`pop_command`](Self::pop_command); state changes accumulate as
/// [`DriverEvent`]s drained with [`pop_event`](Self::pop_event). All
/// time-dependent operations take `now` explicitly.
#[derive(Debug)]
pub struct GarageDoor {
    config: DriverConfig,

    position: DoorPosition,

    /// Incremented on every controller position report. Pending commands
    /// snapshot it at send time to gate inference.
    report_generation: u64,

    switches: [SwitchState; 3],

    next_seq: u8,

    last_fault: Option<u8>,

    last_poll: Option<Instant>,

    outbox: VecDeque<OutboundCommand>,

    events: VecDeque<DriverEvent>,
}

impl GarageDoor {
    /// Create a state machine with the given configuration.
    ///
    /// Position starts [`DoorPosition::Unknown`] and no switch is
    /// confirmed until the controller speaks.
    #[must_use]
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            position: DoorPosition::Unknown,
            report_generation: 0,
            switches: [SwitchState::default(); 3],
            next_seq: 1,
            last_fault: None,
            last_poll: None,
            outbox: VecDeque::new(),
            events: VecDeque::new(),
        }
    }

    /// Current tracked door position.
    #[must_use]
    pub fn position(&self) -> DoorPosition {
        self.position
    }

    /// Whether the eye sensor mapping considers the door open.
    #[must_use]
    pub fn door_open(&self) -> bool {
        self.position.is_open()
    }

    /// Tracked state of one switch.
    #[must_use]
    pub fn switch(&self, kind: SwitchKind) -> &SwitchState {
        &self.switches[kind.index()]
    }

    /// Most recent controller fault code, if any.
    #[must_use]
    pub fn last_fault(&self) -> Option<u8> {
        self.last_fault
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Serializable snapshot of the full device state.
    #[must_use]
    pub fn snapshot(&self) -> DriverSnapshot {
        let snap = |st: &SwitchState| SwitchSnapshot {
            requested: st.requested,
            confirmed: st.confirmed,
            in_flight: st.pending.is_some(),
        };
        DriverSnapshot {
            position: self.position,
            door_open: self.door_open(),
            last_fault: self.last_fault,
            door: snap(self.switch(SwitchKind::Door)),
            light: snap(self.switch(SwitchKind::Light)),
            lock: snap(self.switch(SwitchKind::Lock)),
        }
    }

    /// Request a switch change.
    ///
    /// Queues a `SetSwitch` command unless the switch is already
    /// confirmed at `value` or an identical command is in flight. A
    /// conflicting in-flight command is superseded by default; with
    /// `strict_single_flight` set the request is rejected instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SwitchBusy`] in strict mode when a command for
    /// this switch is already awaiting acknowledgment.
    pub fn request_switch(
        &mut self,
        kind: SwitchKind,
        value: bool,
        now: Instant,
    ) -> Result<RequestOutcome> {
        let generation = self.report_generation;
        self.switches[kind.index()].requested = value;

        if let Some(pending) = self.switches[kind.index()].pending {
            if pending.value == value {
                debug!(switch = %kind, value, seq = pending.seq, "request matches in-flight command");
                return Ok(RequestOutcome::AlreadyPending);
            }
            if self.config.strict_single_flight {
                return Err(Error::SwitchBusy { switch: kind });
            }

            // Supersede: fresh seq so the old ack cannot confirm the new
            // value; `since` keeps the original request time.
            let seq = self.next_seq;
            self.next_seq = self.next_seq.wrapping_add(1);
            self.switches[kind.index()].pending = Some(PendingCommand {
                value,
                seq,
                since: pending.since,
                last_sent: now,
                retries: 0,
                generation_at_send: generation,
            });
            debug!(switch = %kind, value, old_seq = pending.seq, seq, "superseding in-flight command");
            self.outbox.push_back(OutboundCommand::SetSwitch {
                switch: kind,
                value,
                seq,
            });
            return Ok(RequestOutcome::Superseded);
        }

        if self.switches[kind.index()].confirmed == Some(value) {
            return Ok(RequestOutcome::AlreadyConfirmed);
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.switches[kind.index()].pending = Some(PendingCommand {
            value,
            seq,
            since: now,
            last_sent: now,
            retries: 0,
            generation_at_send: generation,
        });
        debug!(switch = %kind, value, seq, "sending switch command");
        self.outbox.push_back(OutboundCommand::SetSwitch {
            switch: kind,
            value,
            seq,
        });
        Ok(RequestOutcome::Sent)
    }

    /// Process a decoded controller message.
    pub fn on_message(&mut self, msg: InboundMessage, _now: Instant) {
        match msg {
            InboundMessage::Ack { switch, value, seq } => self.on_ack(switch, value, seq),
            InboundMessage::Position(position) => {
                self.report_generation += 1;
                self.set_position(position);
            }
            InboundMessage::Fault { code } => {
                warn!(code, "controller reported fault");
                self.last_fault = Some(code);
                self.events.push_back(DriverEvent::Fault { code });
            }
        }
    }

    /// Advance timers: retransmit or abandon overdue commands and issue
    /// periodic status polls.
    pub fn tick(&mut self, now: Instant) {
        for kind in SwitchKind::ALL {
            let ack_timeout = self.config.ack_timeout();
            let max_retries = self.config.max_retries;
            let state = &mut self.switches[kind.index()];

            let Some(mut pending) = state.pending else {
                continue;
            };
            if now.duration_since(pending.last_sent) < ack_timeout {
                continue;
            }

            if pending.retries < max_retries {
                pending.retries += 1;
                pending.last_sent = now;
                state.pending = Some(pending);
                debug!(
                    switch = %kind,
                    seq = pending.seq,
                    attempt = pending.retries + 1,
                    "ack overdue, retransmitting"
                );
                self.outbox.push_back(OutboundCommand::SetSwitch {
                    switch: kind,
                    value: pending.value,
                    seq: pending.seq,
                });
            } else {
                state.pending = None;
                let requested = state.requested;
                let confirmed = state.confirmed;
                warn!(
                    switch = %kind,
                    seq = pending.seq,
                    waited_ms = now.duration_since(pending.since).as_millis() as u64,
                    "command abandoned, no ack after retransmissions"
                );
                self.events.push_back(DriverEvent::SwitchCommandFailed {
                    switch: kind,
                    requested,
                    confirmed,
                });
            }
        }

        let poll_due = self
            .last_poll
            .is_none_or(|t| now.duration_since(t) >= self.config.poll_interval());
        if poll_due {
            self.last_poll = Some(now);
            self.outbox.push_back(OutboundCommand::QueryStatus);
        }
    }

    /// Queue an immediate status query, outside the regular poll cadence.
    pub fn queue_status_query(&mut self) {
        self.outbox.push_back(OutboundCommand::QueryStatus);
    }

    /// Next outbound command, if any.
    pub fn pop_command(&mut self) -> Option<OutboundCommand> {
        self.outbox.pop_front()
    }

    /// Next state-change event, if any.
    pub fn pop_event(&mut self) -> Option<DriverEvent> {
        self.events.pop_front()
    }

    fn on_ack(&mut self, switch: SwitchKind, value: bool, seq: u8) {
        let state = &mut self.switches[switch.index()];
        let Some(pending) = state.pending else {
            debug!(switch = %switch, value, seq, "ack with no command in flight, dropping");
            return;
        };
        if pending.seq != seq {
            debug!(
                switch = %switch,
                value,
                seq,
                expected = pending.seq,
                "stale ack, dropping"
            );
            return;
        }
        if pending.value != value {
            warn!(switch = %switch, sent = pending.value, acked = value, seq, "controller acked a different value");
        }

        state.pending = None;
        state.confirmed = Some(value);
        self.events
            .push_back(DriverEvent::SwitchConfirmed { switch, value });

        // The door relay starts motion; reflect it right away unless a
        // position report already arrived after the command went out.
        if switch == SwitchKind::Door && self.report_generation == pending.generation_at_send {
            let inferred = if value {
                (self.position != DoorPosition::Open).then_some(DoorPosition::Opening)
            } else {
                (self.position != DoorPosition::Closed).then_some(DoorPosition::Closing)
            };
            if let Some(position) = inferred {
                self.set_position(position);
            }
        }
    }

    fn set_position(&mut self, position: DoorPosition) {
        if position == self.position {
            return;
        }
        if !self.position.can_transition_to(&position) {
            warn!(from = %self.position, to = %position, "unexpected position transition");
        }

        let was_open = self.position.is_open();
        self.position = position;
        self.events
            .push_back(DriverEvent::PositionChanged { position });

        let open = position.is_open();
        if open != was_open {
            self.events.push_back(DriverEvent::DoorOpenChanged { open });
        }
    }
}
