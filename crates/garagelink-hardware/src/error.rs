//! Error types for serial link operations.
//!
//! This module defines error types specific to the physical link layer,
//! covering port disconnection, configuration problems, and raw I/O
//! failures. Protocol-level problems (bad checksums, unknown frames) are
//! not represented here; they belong to the codec layer.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur on the physical serial link.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Port is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Port could not be opened with the requested settings.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Operation is not supported by this link backend.
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Whether the link is gone for good and the driver should stop.
    ///
    /// `Io` errors may be transient (EAGAIN surfaces as `Ok(0)` instead,
    /// but EINTR and friends land here); disconnection and configuration
    /// failures are terminal.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Disconnected { .. } | Self::ConfigurationError { .. }
        )
    }
}
