//! Platform entity adapters for the GarageLink driver.
//!
//! The driver models the controller; this crate models what a
//! home-automation platform sees: three switch entities (door, light,
//! lock), one binary sensor (the doorway eye), and a forwarding task
//! that turns driver events into registry updates.
//!
//! ```no_run
//! use std::sync::Arc;
//! use garagelink_driver::{DriverConfig, DriverService};
//! use garagelink_entities::{EntityRegistry, GarageSwitch, forward_events};
//! use garagelink_hardware::mock::MockSerialLink;
//! # struct MyRegistry;
//! # impl EntityRegistry for MyRegistry {
//! #     fn report(&self, _: garagelink_core::EntityId, _: bool) {}
//! #     fn report_failure(&self, _: garagelink_core::EntityId, _: Option<bool>) {}
//! # }
//!
//! # async fn example() -> garagelink_core::Result<()> {
//! let (link, _controller) = MockSerialLink::new();
//! let (handle, _task) = DriverService::spawn(link, DriverConfig::default());
//!
//! let registry: Arc<dyn EntityRegistry> = Arc::new(MyRegistry);
//! tokio::spawn(forward_events(handle.subscribe(), registry));
//!
//! let door = GarageSwitch::door(handle);
//! door.set_state(true).await?;
//! # Ok(())
//! # }
//! ```

pub mod forward;
pub mod registry;
pub mod sensor;
pub mod switch;

pub use forward::forward_events;
pub use registry::EntityRegistry;
pub use sensor::EyeSensor;
pub use switch::GarageSwitch;
