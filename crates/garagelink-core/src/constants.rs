//! Wire-level and timing constants for the garage-door controller link.
//!
//! The controller speaks a fixed binary framing over its UART. The frame
//! envelope (start marker, kind, length, checksum) and the timing defaults
//! below are the contract the rest of the workspace is built against.
//!
//! # Frame Layout
//!
//! ```text
//! SOF  KIND LEN  PAYLOAD[LEN]  CHK
//! 0x02 ...  ...  ...           XOR(KIND, LEN, PAYLOAD)
//! ```
//!
//! # Protocol Compliance
//!
//! The position codes and switch identifiers are pinned against the traffic
//! observed on the physical opener board. Changing them breaks
//! compatibility with deployed controllers.

// ============================================================================
// Frame Envelope
// ============================================================================

/// Start-of-frame marker.
///
/// Every frame on the link begins with this byte. Bytes between frames that
/// are not part of a valid envelope are treated as line noise.
pub const START_BYTE: u8 = 0x02;

/// Fixed envelope overhead in bytes: SOF + KIND + LEN + CHK.
pub const FRAME_OVERHEAD: usize = 4;

/// Maximum payload length accepted in a frame.
///
/// The controller never emits more than a handful of payload bytes; a LEN
/// byte above this limit marks the frame as corrupt and triggers
/// resynchronization rather than a large speculative read.
pub const MAX_PAYLOAD_LEN: usize = 16;

// ============================================================================
// Message Kinds
// ============================================================================

/// Outbound: request a switch state change. Payload: `[switch, value, seq]`.
pub const KIND_SET_SWITCH: u8 = 0x41;

/// Outbound: ask the controller to report current state. Empty payload.
pub const KIND_QUERY_STATUS: u8 = 0x42;

/// Inbound: acknowledgement of a `SetSwitch`. Payload: `[switch, value, seq]`.
pub const KIND_ACK: u8 = 0x81;

/// Inbound: door position report. Payload: `[position_code]`.
pub const KIND_POSITION_REPORT: u8 = 0x82;

/// Inbound: controller fault notification. Payload: `[error_code]`.
pub const KIND_FAULT: u8 = 0x83;

// ============================================================================
// Switch Identifiers
// ============================================================================

/// Wire identifier for the door actuator switch.
pub const SWITCH_DOOR: u8 = 0x01;

/// Wire identifier for the worklight switch.
pub const SWITCH_LIGHT: u8 = 0x02;

/// Wire identifier for the travel lock switch.
pub const SWITCH_LOCK: u8 = 0x03;

// ============================================================================
// Door Position Codes
// ============================================================================
//
// These are the raw state bytes the opener board reports. The moving and
// stopped codes live in a different range than the resting codes; both
// ranges are reproduced verbatim from captured traffic.

/// Door is travelling upward.
pub const POSITION_OPENING: u8 = 0x01;

/// Door is travelling downward.
pub const POSITION_CLOSING: u8 = 0x04;

/// Door halted between the endpoints.
pub const POSITION_STOPPED: u8 = 0x06;

/// Door fully open.
pub const POSITION_OPEN: u8 = 0x52;

/// Door fully closed.
pub const POSITION_CLOSED: u8 = 0x55;

// ============================================================================
// Timing Defaults
// ============================================================================

/// Default time to wait for an ack before retransmitting (milliseconds).
///
/// The board answers well inside 100ms when healthy; 250ms leaves room for
/// a busy scheduler tick on either end without stretching user-visible
/// latency.
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 250;

/// Default number of retransmissions before a command is abandoned.
pub const DEFAULT_MAX_RETRIES: u8 = 2;

/// Default interval between unsolicited status polls (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Default driver scheduler tick interval (milliseconds).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 20;
