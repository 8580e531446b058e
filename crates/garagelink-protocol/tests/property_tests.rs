//! Property-based tests for frame encoding and stream parsing.
//!
//! These tests use proptest to generate random message parameters and raw
//! byte noise, verifying that wire-format invariants hold across the whole
//! input space.

use proptest::prelude::*;

use garagelink_core::constants::MAX_PAYLOAD_LEN;
use garagelink_core::{DoorPosition, SwitchKind};
use garagelink_protocol::{InboundMessage, OutboundCommand, StreamEvent, StreamParser};

/// Strategy for generating valid switch kinds.
fn any_switch() -> impl Strategy<Value = SwitchKind> {
    prop_oneof![
        Just(SwitchKind::Door),
        Just(SwitchKind::Light),
        Just(SwitchKind::Lock),
    ]
}

/// Strategy for generating reportable door positions (Unknown has no wire code).
fn any_reported_position() -> impl Strategy<Value = DoorPosition> {
    prop_oneof![
        Just(DoorPosition::Open),
        Just(DoorPosition::Closed),
        Just(DoorPosition::Opening),
        Just(DoorPosition::Closing),
        Just(DoorPosition::Stopped),
    ]
}

/// Strategy for generating outbound commands.
fn any_command() -> impl Strategy<Value = OutboundCommand> {
    prop_oneof![
        (any_switch(), any::<bool>(), any::<u8>()).prop_map(|(switch, value, seq)| {
            OutboundCommand::SetSwitch { switch, value, seq }
        }),
        Just(OutboundCommand::QueryStatus),
    ]
}

/// Strategy for generating inbound messages.
fn any_inbound() -> impl Strategy<Value = InboundMessage> {
    prop_oneof![
        (any_switch(), any::<bool>(), any::<u8>()).prop_map(|(switch, value, seq)| {
            InboundMessage::Ack { switch, value, seq }
        }),
        any_reported_position().prop_map(InboundMessage::Position),
        any::<u8>().prop_map(|code| InboundMessage::Fault { code }),
    ]
}

proptest! {
    /// Property: every command survives the wire intact.
    #[test]
    fn prop_command_wire_roundtrip(cmd in any_command()) {
        let mut parser = StreamParser::new();
        parser.feed(&cmd.to_frame().to_wire());

        let Some(StreamEvent::Frame(frame)) = parser.next_event() else {
            panic!("encoded command must parse as a frame");
        };
        prop_assert_eq!(OutboundCommand::try_from(&frame).unwrap(), cmd);
        prop_assert!(parser.next_event().is_none());
    }

    /// Property: every controller report survives the wire intact.
    #[test]
    fn prop_report_wire_roundtrip(msg in any_inbound()) {
        let mut parser = StreamParser::new();
        parser.feed(&msg.to_frame().to_wire());

        let Some(StreamEvent::Frame(frame)) = parser.next_event() else {
            panic!("encoded report must parse as a frame");
        };
        prop_assert_eq!(InboundMessage::try_from(&frame).unwrap(), msg);
    }

    /// Property: a frame decodes identically no matter how the bytes are
    /// chunked on arrival.
    #[test]
    fn prop_chunking_is_invisible(
        msg in any_inbound(),
        chunk in 1usize..=8,
    ) {
        let wire = msg.to_frame().to_wire();

        let mut parser = StreamParser::new();
        for piece in wire.chunks(chunk) {
            parser.feed(piece);
        }

        let Some(StreamEvent::Frame(frame)) = parser.next_event() else {
            panic!("chunked frame must still parse");
        };
        prop_assert_eq!(InboundMessage::try_from(&frame).unwrap(), msg);
    }

    /// Property: arbitrary garbage never panics the parser and never
    /// leaves it holding more than one pending frame's worth of ambiguity.
    #[test]
    fn prop_garbage_never_panics(noise in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut parser = StreamParser::new();
        parser.feed(&noise);
        while parser.next_event().is_some() {}

        // The parser must stay usable after any amount of noise: flush the
        // residue with filler, then a clean frame must decode.
        parser.feed(&[0x00; MAX_PAYLOAD_LEN + 4]);
        while parser.next_event().is_some() {}

        let msg = InboundMessage::Position(DoorPosition::Closed);
        parser.feed(&msg.to_frame().to_wire());

        let mut decoded = None;
        while let Some(event) = parser.next_event() {
            if let StreamEvent::Frame(frame) = event {
                decoded = Some(InboundMessage::try_from(&frame).unwrap());
            }
        }
        prop_assert_eq!(decoded, Some(msg));
    }

    /// Property: checksum always covers kind, length, and payload, so any
    /// single flipped bit in those bytes is caught.
    #[test]
    fn prop_single_bit_flip_detected(
        msg in any_inbound(),
        byte_idx in 1usize..4,
        bit in 0u8..8,
    ) {
        let mut wire = msg.to_frame().to_wire().to_vec();
        // Skip the SOF byte; flipping it is a framing problem, not checksum.
        let idx = byte_idx.min(wire.len() - 2);
        wire[idx] ^= 1 << bit;

        let mut parser = StreamParser::new();
        parser.feed(&wire);

        while let Some(event) = parser.next_event() {
            if let StreamEvent::Frame(frame) = event {
                // A frame may still emerge if the flip produced a plausible
                // shorter frame; it must never equal the original message.
                prop_assert_ne!(
                    frame,
                    msg.to_frame(),
                    "flipped frame must not decode as the original"
                );
            }
        }
    }
}

#[cfg(test)]
mod standard_tests {
    use super::*;

    /// Standard test: every generated position has a wire code.
    #[test]
    fn test_reported_positions_have_codes() {
        proptest!(|(pos in any_reported_position())| {
            prop_assert!(pos.as_code().is_some());
        });
    }

    /// Standard test: generated payloads stay inside the frame limit.
    #[test]
    fn test_messages_fit_payload_budget() {
        proptest!(|(msg in any_inbound())| {
            let frame = msg.to_frame();
            prop_assert!(frame.payload().len() <= MAX_PAYLOAD_LEN);
        });
    }
}
