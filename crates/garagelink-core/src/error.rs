use crate::types::SwitchKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Frame-level errors, recovered by resynchronization
    #[error("corrupt frame: {reason}")]
    FrameError { reason: String },

    #[error("frame buffer overflowed at {size} bytes, link resynchronized")]
    FrameOverflow { size: usize },

    #[error("unknown frame kind 0x{kind:02X}")]
    UnknownKind { kind: u8 },

    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },

    // Command errors
    #[error("a command for {switch} is already in flight")]
    SwitchBusy { switch: SwitchKind },

    #[error("{switch} command abandoned after {retries} retransmissions")]
    CommandFailed { switch: SwitchKind, retries: u8 },

    // Link errors
    #[error("serial link closed")]
    LinkClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a `FrameError` from any displayable reason.
    pub fn frame(reason: impl Into<String>) -> Self {
        Error::FrameError {
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors the link recovers from on its own
    /// (resynchronization or buffer reset). Everything else either fails a
    /// single command or the whole component.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FrameError { .. }
                | Error::FrameOverflow { .. }
                | Error::UnknownKind { .. }
                | Error::InvalidPayload { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
