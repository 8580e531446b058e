//! Serial link trait definition.
//!
//! This module defines the contract between the driver core and the
//! physical transport carrying controller frames. The trait enables easy
//! substitution between a mock link (for development and testing) and a
//! real UART backend.
//!
//! The interface is deliberately synchronous and non-blocking: the driver
//! polls the link once per scheduler tick, drains whatever bytes are
//! waiting, and moves on. Blocking reads would stall the tick loop, and a
//! garage controller's traffic is far too sparse to justify readiness
//! notification.

use crate::error::Result;

/// A byte-oriented, non-blocking serial transport.
///
/// Implementations must never block in [`poll_read`](SerialLink::poll_read):
/// when no bytes are waiting, return `Ok(0)` immediately. Writes may block
/// briefly (UART FIFOs drain in microseconds at these frame sizes) but must
/// complete the whole buffer or fail.
pub trait SerialLink: Send {
    /// Read whatever bytes are currently available into `buf`.
    ///
    /// Returns the number of bytes read; `Ok(0)` means the line is idle,
    /// not closed. A closed or vanished port is an error.
    fn poll_read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write the entire buffer to the link.
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Whether the underlying port is still open.
    fn is_open(&self) -> bool;

    /// Human-readable link name for logs (port path or mock label).
    fn name(&self) -> &str;
}

impl SerialLink for Box<dyn SerialLink> {
    fn poll_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).poll_read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_all(buf)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
