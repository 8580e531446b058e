//! Driver event to registry forwarding.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use garagelink_core::EntityId;
use garagelink_driver::DriverEvent;

use crate::registry::EntityRegistry;

/// Forward driver events to a platform registry until the driver stops.
///
/// Confirmed switch states and eye sensor edges become
/// [`report`](EntityRegistry::report) calls; abandoned commands become
/// [`report_failure`](EntityRegistry::report_failure) calls. Position
/// details and fault codes are log-only; the platform sees entities, not
/// the wire protocol.
///
/// A subscriber that lags behind the broadcast channel drops the missed
/// events and keeps going: every report carries absolute state, so the
/// next one heals the gap.
pub async fn forward_events(
    mut events: broadcast::Receiver<DriverEvent>,
    registry: Arc<dyn EntityRegistry>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "event forwarder lagged, state reports dropped");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("driver stopped, event forwarder exiting");
                return;
            }
        };

        match event {
            DriverEvent::SwitchConfirmed { switch, value } => {
                registry.report(switch.entity_id(), value);
            }
            DriverEvent::SwitchCommandFailed {
                switch, confirmed, ..
            } => {
                registry.report_failure(switch.entity_id(), confirmed);
            }
            DriverEvent::DoorOpenChanged { open } => {
                registry.report(EntityId::EyeSensor, open);
            }
            DriverEvent::PositionChanged { position } => {
                debug!(%position, "door position changed");
            }
            DriverEvent::Fault { code } => {
                warn!(code, "controller fault surfaced to platform log");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testing::RecordingRegistry;
    use garagelink_core::{DoorPosition, SwitchKind};

    async fn run_forwarder(events: Vec<DriverEvent>) -> Arc<RecordingRegistry> {
        let (tx, rx) = broadcast::channel(16);
        let registry = Arc::new(RecordingRegistry::default());

        let task = tokio::spawn(forward_events(rx, registry.clone()));
        for event in events {
            tx.send(event).unwrap();
        }
        drop(tx);
        task.await.unwrap();

        registry
    }

    #[tokio::test]
    async fn test_confirmations_and_eye_edges_reach_registry() {
        let registry = run_forwarder(vec![
            DriverEvent::SwitchConfirmed {
                switch: SwitchKind::Light,
                value: true,
            },
            DriverEvent::PositionChanged {
                position: DoorPosition::Opening,
            },
            DriverEvent::DoorOpenChanged { open: true },
            DriverEvent::SwitchConfirmed {
                switch: SwitchKind::Light,
                value: false,
            },
        ])
        .await;

        assert_eq!(
            *registry.reports.lock().unwrap(),
            vec![
                (EntityId::Light, true),
                (EntityId::EyeSensor, true),
                (EntityId::Light, false),
            ]
        );
        assert!(registry.failures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_command_failure_reported_with_rollback_state() {
        let registry = run_forwarder(vec![DriverEvent::SwitchCommandFailed {
            switch: SwitchKind::Door,
            requested: true,
            confirmed: Some(false),
        }])
        .await;

        assert_eq!(
            *registry.failures.lock().unwrap(),
            vec![(EntityId::Door, Some(false))]
        );
        assert!(registry.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_faults_do_not_become_entity_reports() {
        let registry = run_forwarder(vec![DriverEvent::Fault { code: 0x21 }]).await;
        assert!(registry.reports.lock().unwrap().is_empty());
        assert!(registry.failures.lock().unwrap().is_empty());
    }
}
