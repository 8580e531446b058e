//! garagelink — garage door controller driver.
//!
//! Composition root that wires the stack together: serial link, driver
//! service, entity adapters, and a logging registry. By default it runs
//! against the built-in controller simulator and walks through a door
//! cycle; with the `hardware-serial` feature and `GARAGELINK_PORT` set it
//! drives a real controller instead.
//!
//! Environment:
//! - `GARAGELINK_CONFIG` — path to a JSON [`DriverConfig`] file
//! - `GARAGELINK_PORT` — serial port path (requires `hardware-serial`)
//! - `GARAGELINK_BAUD` — baud rate, default 9600
//! - `RUST_LOG` — log filter, default `info`

mod simulator;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use garagelink_core::{DoorPosition, EntityId, SwitchKind};
use garagelink_driver::{DriverConfig, DriverHandle, DriverService};
use garagelink_entities::{EntityRegistry, EyeSensor, GarageSwitch, forward_events};
use garagelink_hardware::mock::MockSerialLink;

/// Registry that logs entity updates instead of talking to a platform.
struct LogRegistry;

impl EntityRegistry for LogRegistry {
    fn report(&self, entity: EntityId, value: bool) {
        info!(%entity, value, "entity state");
    }

    fn report_failure(&self, entity: EntityId, last_confirmed: Option<bool>) {
        info!(%entity, ?last_confirmed, "entity command failed");
    }
}

fn load_config() -> anyhow::Result<DriverConfig> {
    match std::env::var("GARAGELINK_CONFIG") {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config file {path}"))
        }
        Err(_) => Ok(DriverConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;

    #[cfg(feature = "hardware-serial")]
    if let Ok(port) = std::env::var("GARAGELINK_PORT") {
        let baud = std::env::var("GARAGELINK_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9600);
        let link = garagelink_hardware::UartLink::open(&port, baud)?;
        info!(port, baud, "driving real controller");

        let (handle, task) = DriverService::spawn(link, config);
        tokio::spawn(forward_events(handle.subscribe(), Arc::new(LogRegistry)));
        demo_cycle(handle).await?;
        return Ok(task.await??);
    }

    let (link, wire) = MockSerialLink::new();
    tokio::spawn(simulator::run(wire));
    info!("driving built-in controller simulator");

    let (handle, task) = DriverService::spawn(link, config);
    tokio::spawn(forward_events(handle.subscribe(), Arc::new(LogRegistry)));

    demo_cycle(handle).await?;
    drop(task);
    Ok(())
}

/// Open the door, flash the light, close the door, print the snapshot.
async fn demo_cycle(handle: DriverHandle) -> anyhow::Result<()> {
    let door = GarageSwitch::door(handle.clone());
    let light = GarageSwitch::light(handle.clone());
    let eye = EyeSensor::new(handle.clone());

    door.set_state(true).await?;
    wait_for_position(handle.clone(), DoorPosition::Open).await?;
    info!(eye_open = eye.currently_open(), "door open");

    light.set_state(true).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    light.set_state(false).await?;

    door.set_state(false).await?;
    wait_for_position(handle.clone(), DoorPosition::Closed).await?;
    info!(eye_open = eye.currently_open(), "door closed");

    let snapshot = handle.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn wait_for_position(
    mut handle: DriverHandle,
    target: DoorPosition,
) -> anyhow::Result<()> {
    if handle.snapshot().position == target {
        return Ok(());
    }
    let deadline = Duration::from_secs(30);
    tokio::time::timeout(deadline, async {
        loop {
            let snap = handle.changed().await?;
            if snap.position == target {
                return Ok::<_, garagelink_core::Error>(());
            }
            if snap.switch(SwitchKind::Door).confirmed.is_none() && snap.last_fault.is_some() {
                tracing::warn!(fault = ?snap.last_fault, "fault while waiting for travel");
            }
        }
    })
    .await
    .with_context(|| format!("door never reached {target}"))??;
    Ok(())
}
