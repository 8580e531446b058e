//! Platform registry abstraction.
//!
//! The driver publishes entity state changes to whatever home-automation
//! platform hosts it through this trait. Implementations translate the
//! calls into their platform's native state updates (MQTT topics, HTTP
//! callbacks, an in-process bus); the driver neither knows nor cares.

use garagelink_core::EntityId;

/// Sink for entity state updates.
///
/// Implementations must be cheap and non-blocking: calls happen on the
/// event-forwarding task, and a slow registry delays every entity behind
/// it. Queue and return.
pub trait EntityRegistry: Send + Sync {
    /// A binary entity settled at `value`.
    fn report(&self, entity: EntityId, value: bool);

    /// A commanded entity failed to reach its requested state.
    ///
    /// `last_confirmed` is the state the controller last acknowledged,
    /// so the platform can roll its display back; `None` means the true
    /// state was never learned.
    fn report_failure(&self, entity: EntityId, last_confirmed: Option<bool>);
}
