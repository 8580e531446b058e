//! Mock implementations for testing and development.

mod serial;

pub use serial::{MockSerialHandle, MockSerialLink};
