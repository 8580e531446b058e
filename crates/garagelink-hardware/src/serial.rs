//! Real UART backend over the `serialport` crate.
//!
//! Enabled with the `hardware-serial` feature. The port is opened with a
//! near-zero read timeout so [`SerialLink::poll_read`] keeps its
//! non-blocking contract; a timed-out read maps to `Ok(0)` (idle line).

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use tracing::info;

use crate::{HardwareError, Result, traits::SerialLink};

/// Read timeout for the underlying port.
///
/// Short enough that a poll on an idle line returns within the scheduler
/// tick; long enough that the OS does not busy-spin.
const POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Serial link backed by a physical UART.
pub struct UartLink {
    port: Box<dyn serialport::SerialPort>,
    name: String,
    open: bool,
}

impl UartLink {
    /// Open a UART at `path` with the given baud rate, 8N1 framing.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(POLL_TIMEOUT)
            .open()
            .map_err(|e| {
                HardwareError::configuration(format!("failed to open {path}: {e}"))
            })?;

        info!(port = path, baud_rate, "serial port opened");

        Ok(Self {
            port,
            name: path.to_string(),
            open: true,
        })
    }
}

impl SerialLink for UartLink {
    fn poll_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if !self.open {
            return Err(HardwareError::disconnected(&self.name));
        }

        match self.port.read(buf) {
            Ok(n) => Ok(n),
            // An idle line surfaces as a timeout with the tiny poll
            // timeout configured above.
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(0)
            }
            Err(e) if e.kind() == ErrorKind::BrokenPipe || e.kind() == ErrorKind::NotConnected => {
                self.open = false;
                Err(HardwareError::disconnected(&self.name))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if !self.open {
            return Err(HardwareError::disconnected(&self.name));
        }

        match self.port.write_all(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::BrokenPipe || e.kind() == ErrorKind::NotConnected => {
                self.open = false;
                Err(HardwareError::disconnected(&self.name))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> &str {
        &self.name
    }
}
