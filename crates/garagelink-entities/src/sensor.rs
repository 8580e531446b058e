//! Eye sensor entity adapter.

use garagelink_core::{DoorPosition, EntityId};
use garagelink_driver::DriverHandle;

/// The light-barrier ("eye") binary sensor.
///
/// The controller exposes no separate eye input; the sensor reflects
/// whether the doorway is passable. It asserts as soon as the door starts
/// opening and stays asserted until the door is fully closed, stopped, or
/// closing.
#[derive(Debug, Clone)]
pub struct EyeSensor {
    handle: DriverHandle,
}

impl EyeSensor {
    #[must_use]
    pub fn new(handle: DriverHandle) -> Self {
        Self { handle }
    }

    /// Platform entity identifier.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        EntityId::EyeSensor
    }

    /// Whether the doorway currently reads as open.
    #[must_use]
    pub fn currently_open(&self) -> bool {
        self.handle.snapshot().door_open
    }

    /// The tracked door position behind the sensor value.
    #[must_use]
    pub fn position(&self) -> DoorPosition {
        self.handle.snapshot().position
    }
}
