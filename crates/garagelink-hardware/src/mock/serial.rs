//! Mock serial link for testing and development.
//!
//! This module provides a simulated serial port that can be controlled
//! programmatically for testing without requiring physical hardware.

use std::collections::VecDeque;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use crate::{HardwareError, Result, traits::SerialLink};

/// Shared state between a mock link and its handle.
#[derive(Debug, Default)]
struct Shared {
    /// Bytes waiting for the driver to read (controller -> driver).
    inbound: Mutex<VecDeque<u8>>,

    /// Bytes the driver has written (driver -> controller).
    outbound: Mutex<VecDeque<u8>>,

    /// Cleared by [`MockSerialHandle::disconnect`] to simulate unplugging.
    open: AtomicBool,
}

/// Mock serial link for testing and development.
///
/// The link reads from an internal byte queue filled through a
/// [`MockSerialHandle`], which plays the role of the controller on the
/// far end of the wire.
///
/// # Examples
///
/// ```
/// use garagelink_hardware::mock::MockSerialLink;
/// use garagelink_hardware::SerialLink;
///
/// let (mut link, handle) = MockSerialLink::new();
///
/// // Controller side puts bytes on the wire.
/// handle.inject(&[0x02, 0x42, 0x00, 0x42]);
///
/// // Driver side drains them without blocking.
/// let mut buf = [0u8; 64];
/// let n = link.poll_read(&mut buf).unwrap();
/// assert_eq!(&buf[..n], &[0x02, 0x42, 0x00, 0x42]);
///
/// // Idle line reads as zero bytes, not an error.
/// assert_eq!(link.poll_read(&mut buf).unwrap(), 0);
/// ```
#[derive(Debug)]
pub struct MockSerialLink {
    shared: Arc<Shared>,
    name: String,
}

impl MockSerialLink {
    /// Create a new mock link with the default name.
    ///
    /// Returns a `(MockSerialLink, MockSerialHandle)` pair; the handle is
    /// the controller end of the simulated wire.
    pub fn new() -> (Self, MockSerialHandle) {
        Self::with_name("mock-serial".to_string())
    }

    /// Create a new mock link with a custom name.
    pub fn with_name(name: String) -> (Self, MockSerialHandle) {
        let shared = Arc::new(Shared {
            open: AtomicBool::new(true),
            ..Shared::default()
        });

        let link = Self {
            shared: Arc::clone(&shared),
            name: name.clone(),
        };
        let handle = MockSerialHandle { shared, name };

        (link, handle)
    }
}

impl SerialLink for MockSerialLink {
    fn poll_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.is_open() {
            return Err(HardwareError::disconnected(&self.name));
        }

        let mut inbound = self
            .shared
            .inbound
            .lock()
            .expect("mock serial lock poisoned");

        let n = buf.len().min(inbound.len());
        for slot in buf.iter_mut().take(n) {
            *slot = inbound.pop_front().expect("length checked above");
        }
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if !self.is_open() {
            return Err(HardwareError::disconnected(&self.name));
        }

        self.shared
            .outbound
            .lock()
            .expect("mock serial lock poisoned")
            .extend(buf);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Acquire)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handle for controlling a mock serial link.
///
/// This handle is the far end of the simulated wire: it injects bytes for
/// the driver to read, inspects bytes the driver wrote, and can simulate
/// the cable being unplugged. It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockSerialHandle {
    shared: Arc<Shared>,
    name: String,
}

impl MockSerialHandle {
    /// Put bytes on the wire for the driver to read.
    pub fn inject(&self, bytes: &[u8]) {
        self.shared
            .inbound
            .lock()
            .expect("mock serial lock poisoned")
            .extend(bytes);
    }

    /// Take everything the driver has written so far.
    pub fn drain_written(&self) -> Vec<u8> {
        self.shared
            .outbound
            .lock()
            .expect("mock serial lock poisoned")
            .drain(..)
            .collect()
    }

    /// Number of driver-written bytes not yet drained.
    #[must_use]
    pub fn written_len(&self) -> usize {
        self.shared
            .outbound
            .lock()
            .expect("mock serial lock poisoned")
            .len()
    }

    /// Simulate the cable being unplugged.
    ///
    /// Subsequent reads and writes on the link fail with
    /// [`HardwareError::Disconnected`].
    pub fn disconnect(&self) {
        self.shared.open.store(false, Ordering::Release);
    }

    /// Link name this handle is attached to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
