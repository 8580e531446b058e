//! Driver core for a serial garage door controller.
//!
//! This crate pairs a synchronous, I/O-free state machine
//! ([`GarageDoor`]) with an async service ([`DriverService`]) that owns
//! the serial link and runs the machine on a fixed tick. Applications
//! talk to the running service through a cloneable [`DriverHandle`].
//!
//! # Example
//!
//! ```no_run
//! use garagelink_core::SwitchKind;
//! use garagelink_driver::{DriverConfig, DriverService};
//! use garagelink_hardware::mock::MockSerialLink;
//!
//! # async fn example() -> garagelink_core::Result<()> {
//! let (link, _controller) = MockSerialLink::new();
//! let (handle, _task) = DriverService::spawn(link, DriverConfig::default());
//!
//! handle.set_switch(SwitchKind::Door, true).await?;
//! println!("door position: {}", handle.snapshot().position);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod service;
pub mod state_machine;

pub use config::DriverConfig;
pub use service::{DriverHandle, DriverService};
pub use state_machine::{
    DriverEvent, DriverSnapshot, GarageDoor, RequestOutcome, SwitchSnapshot, SwitchState,
};
