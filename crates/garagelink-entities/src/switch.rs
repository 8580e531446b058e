//! Switch entity adapters.
//!
//! One [`GarageSwitch`] per controller relay (door, light, lock). Each
//! adapter wraps a [`DriverHandle`] with the entity's identity and icon
//! pair; the actual state lives in the driver and is read from its
//! snapshot, so adapters carry no state of their own and any number of
//! them can coexist.

use garagelink_core::{EntityId, Result, SwitchKind};
use garagelink_driver::{DriverHandle, RequestOutcome};

/// A controller relay exposed as a platform switch entity.
#[derive(Debug, Clone)]
pub struct GarageSwitch {
    kind: SwitchKind,
    handle: DriverHandle,
    icon_on: &'static str,
    icon_off: &'static str,
}

impl GarageSwitch {
    /// The door relay switch.
    #[must_use]
    pub fn door(handle: DriverHandle) -> Self {
        Self {
            kind: SwitchKind::Door,
            handle,
            icon_on: "mdi:garage-open",
            icon_off: "mdi:garage",
        }
    }

    /// The courtesy light switch.
    #[must_use]
    pub fn light(handle: DriverHandle) -> Self {
        Self {
            kind: SwitchKind::Light,
            handle,
            icon_on: "mdi:lightbulb-on",
            icon_off: "mdi:lightbulb",
        }
    }

    /// The travel lock switch.
    #[must_use]
    pub fn lock(handle: DriverHandle) -> Self {
        Self {
            kind: SwitchKind::Lock,
            handle,
            icon_on: "mdi:lock",
            icon_off: "mdi:lock-open",
        }
    }

    /// Which controller relay this entity drives.
    #[must_use]
    pub fn kind(&self) -> SwitchKind {
        self.kind
    }

    /// Platform entity identifier.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.kind.entity_id()
    }

    /// Icon for the given state.
    #[must_use]
    pub fn icon(&self, on: bool) -> &'static str {
        if on { self.icon_on } else { self.icon_off }
    }

    /// Controller-confirmed state; `None` until the first ack.
    #[must_use]
    pub fn state(&self) -> Option<bool> {
        self.handle.snapshot().switch(self.kind).confirmed
    }

    /// Whether a command for this switch is awaiting acknowledgment.
    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.handle.snapshot().switch(self.kind).in_flight
    }

    /// Request a state change.
    ///
    /// Resolves when the driver accepts the request; confirmation follows
    /// on the event stream.
    ///
    /// # Errors
    ///
    /// Returns [`garagelink_core::Error::SwitchBusy`] in strict
    /// single-flight mode, or [`garagelink_core::Error::LinkClosed`] if
    /// the driver has stopped.
    pub async fn set_state(&self, value: bool) -> Result<RequestOutcome> {
        self.handle.set_switch(self.kind, value).await
    }

    /// Request the opposite of the current confirmed state.
    ///
    /// An unconfirmed switch is treated as off, matching the controller's
    /// power-on state.
    ///
    /// # Errors
    ///
    /// Same conditions as [`set_state`](Self::set_state).
    pub async fn toggle(&self) -> Result<RequestOutcome> {
        let current = self.state().unwrap_or(false);
        self.set_state(!current).await
    }
}
