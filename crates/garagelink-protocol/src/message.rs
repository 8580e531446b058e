//! Typed messages carried over the controller link.
//!
//! [`OutboundCommand`] is what the driver sends (switch requests, status
//! polls); [`InboundMessage`] is what the controller answers with (acks,
//! position reports, faults). Conversion to and from [`Frame`] is pure and
//! side-effect free; framing and buffering live in
//! [`StreamParser`](crate::StreamParser).

use crate::frame::Frame;
use garagelink_core::{DoorPosition, Error, Result, SwitchKind, constants::*};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Command sent from the driver to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundCommand {
    /// Request a switch state change.
    ///
    /// `seq` is a request identifier the controller echoes back in its ack;
    /// the driver uses it to pair acks with requests and discard stale ones.
    SetSwitch {
        switch: SwitchKind,
        value: bool,
        seq: u8,
    },

    /// Ask the controller to report current door position.
    QueryStatus,
}

impl OutboundCommand {
    /// Build the wire frame for this command.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        match self {
            OutboundCommand::SetSwitch { switch, value, seq } => Frame::new(
                KIND_SET_SWITCH,
                &[switch.as_byte(), u8::from(*value), *seq],
            )
            .expect("SetSwitch payload is 3 bytes"),
            OutboundCommand::QueryStatus => {
                Frame::new(KIND_QUERY_STATUS, &[]).expect("QueryStatus payload is empty")
            }
        }
    }
}

impl From<OutboundCommand> for Frame {
    fn from(cmd: OutboundCommand) -> Self {
        cmd.to_frame()
    }
}

impl TryFrom<&Frame> for OutboundCommand {
    type Error = Error;

    /// Decode a command frame. This is the controller-side view, used by
    /// the emulated controller in tests and the demo binary.
    fn try_from(frame: &Frame) -> Result<Self> {
        match frame.kind() {
            KIND_SET_SWITCH => {
                let payload = expect_len(frame, "SetSwitch", 3)?;
                Ok(OutboundCommand::SetSwitch {
                    switch: SwitchKind::from_byte(payload[0])?,
                    value: decode_bool("SetSwitch", payload[1])?,
                    seq: payload[2],
                })
            }
            KIND_QUERY_STATUS => {
                expect_len(frame, "QueryStatus", 0)?;
                Ok(OutboundCommand::QueryStatus)
            }
            kind => Err(Error::UnknownKind { kind }),
        }
    }
}

impl fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundCommand::SetSwitch { switch, value, seq } => {
                write!(f, "set {switch}={} (seq {seq})", if *value { "on" } else { "off" })
            }
            OutboundCommand::QueryStatus => write!(f, "query status"),
        }
    }
}

/// Message received from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundMessage {
    /// Acknowledgement of a [`OutboundCommand::SetSwitch`] request.
    ///
    /// `seq` echoes the request identifier; `value` is the state the
    /// controller applied.
    Ack {
        switch: SwitchKind,
        value: bool,
        seq: u8,
    },

    /// Authoritative door position report.
    Position(DoorPosition),

    /// Controller-side fault notification.
    Fault { code: u8 },
}

impl InboundMessage {
    /// Build the wire frame for this message (controller side).
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        match self {
            InboundMessage::Ack { switch, value, seq } => {
                Frame::new(KIND_ACK, &[switch.as_byte(), u8::from(*value), *seq])
                    .expect("Ack payload is 3 bytes")
            }
            InboundMessage::Position(position) => Frame::new(
                KIND_POSITION_REPORT,
                &[position.as_code().expect("Unknown is never sent")],
            )
            .expect("PositionReport payload is 1 byte"),
            InboundMessage::Fault { code } => {
                Frame::new(KIND_FAULT, &[*code]).expect("Fault payload is 1 byte")
            }
        }
    }
}

impl From<InboundMessage> for Frame {
    fn from(msg: InboundMessage) -> Self {
        msg.to_frame()
    }
}

impl TryFrom<&Frame> for InboundMessage {
    type Error = Error;

    fn try_from(frame: &Frame) -> Result<Self> {
        match frame.kind() {
            KIND_ACK => {
                let payload = expect_len(frame, "Ack", 3)?;
                Ok(InboundMessage::Ack {
                    switch: SwitchKind::from_byte(payload[0])?,
                    value: decode_bool("Ack", payload[1])?,
                    seq: payload[2],
                })
            }
            KIND_POSITION_REPORT => {
                let payload = expect_len(frame, "PositionReport", 1)?;
                Ok(InboundMessage::Position(DoorPosition::from_code(
                    payload[0],
                )?))
            }
            KIND_FAULT => {
                let payload = expect_len(frame, "Fault", 1)?;
                Ok(InboundMessage::Fault { code: payload[0] })
            }
            kind => Err(Error::UnknownKind { kind }),
        }
    }
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundMessage::Ack { switch, value, seq } => {
                write!(f, "ack {switch}={} (seq {seq})", if *value { "on" } else { "off" })
            }
            InboundMessage::Position(position) => write!(f, "position {position}"),
            InboundMessage::Fault { code } => write!(f, "fault 0x{code:02X}"),
        }
    }
}

fn expect_len<'a>(frame: &'a Frame, kind: &'static str, len: usize) -> Result<&'a [u8]> {
    let payload = frame.payload();
    if payload.len() != len {
        return Err(Error::InvalidPayload {
            kind,
            reason: format!("expected {len} payload bytes, got {}", payload.len()),
        });
    }
    Ok(payload)
}

fn decode_bool(kind: &'static str, byte: u8) -> Result<bool> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::InvalidPayload {
            kind,
            reason: format!("boolean field must be 0 or 1, got 0x{other:02X}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OutboundCommand::SetSwitch { switch: SwitchKind::Door, value: true, seq: 0 })]
    #[case(OutboundCommand::SetSwitch { switch: SwitchKind::Light, value: false, seq: 255 })]
    #[case(OutboundCommand::SetSwitch { switch: SwitchKind::Lock, value: true, seq: 42 })]
    #[case(OutboundCommand::QueryStatus)]
    fn test_command_round_trip(#[case] cmd: OutboundCommand) {
        let frame = cmd.to_frame();
        let decoded = OutboundCommand::try_from(&frame).unwrap();
        assert_eq!(decoded, cmd);
    }

    #[rstest]
    #[case(InboundMessage::Ack { switch: SwitchKind::Lock, value: true, seq: 7 })]
    #[case(InboundMessage::Position(DoorPosition::Opening))]
    #[case(InboundMessage::Position(DoorPosition::Closed))]
    #[case(InboundMessage::Fault { code: 0xE1 })]
    fn test_inbound_round_trip(#[case] msg: InboundMessage) {
        let frame = msg.to_frame();
        let decoded = InboundMessage::try_from(&frame).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_wrong_payload_length_rejected() {
        let frame = Frame::new(KIND_ACK, &[0x01, 0x01]).unwrap();
        let err = InboundMessage::try_from(&frame).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload { kind: "Ack", .. }));
    }

    #[test]
    fn test_bad_boolean_rejected() {
        let frame = Frame::new(KIND_ACK, &[0x01, 0x02, 0x00]).unwrap();
        assert!(InboundMessage::try_from(&frame).is_err());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let frame = Frame::new(0x7F, &[]).unwrap();
        let err = InboundMessage::try_from(&frame).unwrap_err();
        assert!(matches!(err, Error::UnknownKind { kind: 0x7F }));
    }

    #[test]
    fn test_unknown_position_code_rejected() {
        let frame = Frame::new(KIND_POSITION_REPORT, &[0x5B]).unwrap();
        assert!(InboundMessage::try_from(&frame).is_err());
    }

    #[test]
    fn test_inbound_kinds_not_commands() {
        let frame = InboundMessage::Position(DoorPosition::Open).to_frame();
        assert!(OutboundCommand::try_from(&frame).is_err());
    }
}
