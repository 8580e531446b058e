//! Physical link abstraction for the GarageLink driver.
//!
//! This crate provides the trait-based abstraction between the driver core
//! and the serial wire carrying controller frames, enabling substitution
//! between a mock link (for development and testing) and a real UART.
//!
//! # Design Philosophy
//!
//! - **Poll-based**: the driver polls the link once per scheduler tick;
//!   [`SerialLink::poll_read`] never blocks and returns `Ok(0)` on an idle
//!   line.
//! - **Byte-oriented**: the link carries raw bytes; framing and checksums
//!   live in the protocol layer.
//! - **Error-aware**: all operations return [`Result<T>`][error::Result]
//!   with a [`HardwareError`] distinguishing fatal disconnection from
//!   transient I/O trouble.
//!
//! # Backends
//!
//! - [`mock::MockSerialLink`] — in-memory wire with a controllable far end,
//!   always available.
//! - `UartLink` — real serial port via the `serialport` crate, behind the
//!   `hardware-serial` feature.

pub mod error;
pub mod mock;
pub mod traits;

#[cfg(feature = "hardware-serial")]
pub mod serial;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::SerialLink;

#[cfg(feature = "hardware-serial")]
pub use serial::UartLink;
