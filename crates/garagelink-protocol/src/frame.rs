//! Byte-level frame representation for the controller link.
//!
//! A [`Frame`] is one complete application message in wire form: a kind
//! byte plus an opaque payload, carried inside the SOF/LEN/CHK envelope
//! described in [`garagelink_core::constants`]. Frames are produced by the
//! [`StreamParser`](crate::StreamParser) (inbound) or built from an
//! [`OutboundCommand`](crate::OutboundCommand) (outbound), and consumed
//! exactly once by the next stage.

use bytes::{BufMut, Bytes, BytesMut};
use garagelink_core::{Error, Result, constants::*};
use std::fmt;

/// XOR checksum over the kind, length, and payload bytes.
///
/// This is the trailer the controller computes; the SOF byte is excluded.
#[must_use]
pub fn xor_checksum(kind: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(kind ^ (payload.len() as u8), |acc, &b| acc ^ b)
}

/// One complete message in wire form.
///
/// # Wire Format
///
/// ```text
/// SOF(0x02)  KIND  LEN  PAYLOAD[LEN]  CHK
/// ```
///
/// where `CHK` is the XOR of KIND, LEN, and the payload bytes.
///
/// # Basic Usage
///
/// ```
/// use garagelink_protocol::Frame;
/// use garagelink_core::constants::KIND_POSITION_REPORT;
///
/// let frame = Frame::new(KIND_POSITION_REPORT, &[0x55]).unwrap();
/// let wire = frame.to_wire();
/// assert_eq!(wire[0], 0x02); // SOF
/// assert_eq!(wire.len(), frame.wire_len());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message kind byte.
    kind: u8,

    /// Opaque payload, interpretation depends on `kind`.
    payload: Bytes,
}

impl Frame {
    /// Create a frame from a kind byte and payload.
    ///
    /// # Errors
    /// Returns `Error::FrameError` if the payload exceeds
    /// [`MAX_PAYLOAD_LEN`].
    pub fn new(kind: u8, payload: &[u8]) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::frame(format!(
                "payload length {} exceeds maximum {MAX_PAYLOAD_LEN}",
                payload.len()
            )));
        }
        Ok(Frame {
            kind,
            payload: Bytes::copy_from_slice(payload),
        })
    }

    /// Create a frame from already-owned payload bytes.
    ///
    /// # Errors
    /// Returns `Error::FrameError` if the payload exceeds
    /// [`MAX_PAYLOAD_LEN`].
    pub fn from_payload(kind: u8, payload: Bytes) -> Result<Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::frame(format!(
                "payload length {} exceeds maximum {MAX_PAYLOAD_LEN}",
                payload.len()
            )));
        }
        Ok(Frame { kind, payload })
    }

    /// Message kind byte.
    #[must_use]
    pub fn kind(&self) -> u8 {
        self.kind
    }

    /// Payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total length on the wire, envelope included.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    /// Checksum the controller expects for this frame.
    #[must_use]
    pub fn checksum(&self) -> u8 {
        xor_checksum(self.kind, &self.payload)
    }

    /// Serialize to the full wire envelope.
    #[must_use]
    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        self.write_wire(&mut buf);
        buf.freeze()
    }

    /// Append the wire envelope to an existing buffer.
    ///
    /// Used by the tokio codec to avoid an intermediate allocation.
    pub fn write_wire(&self, buf: &mut BytesMut) {
        buf.reserve(self.wire_len());
        buf.put_u8(START_BYTE);
        buf.put_u8(self.kind);
        buf.put_u8(self.payload.len() as u8);
        buf.put_slice(&self.payload);
        buf.put_u8(self.checksum());
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: String = self
            .payload
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "Frame[kind=0x{:02X}, payload=[{hex}]]", self.kind)
    }
}
