//! Async driver service around the state machine.
//!
//! This module wraps the synchronous [`GarageDoor`] core in a Tokio task
//! that owns the serial link. The task runs a fixed-tick loop: drain bytes
//! from the link into the stream parser, feed decoded messages to the
//! state machine, advance its timers, and flush whatever commands it
//! queued back onto the wire.
//!
//! ```text
//!                 ┌──────────── DriverService task ────────────┐
//! DriverHandle ──mpsc──> GarageDoor <──StreamParser<── SerialLink
//!      │                     │                             ▲
//!      │<──watch── snapshot  └──outbox───────────────────> │
//!      │<──broadcast── DriverEvent
//! ```
//!
//! The handle side is cheap to clone: requests travel over an mpsc
//! channel, state changes fan out over a broadcast channel, and the
//! latest snapshot is always readable from a watch channel without
//! touching the task.

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use garagelink_core::{Error, Result, SwitchKind};
use garagelink_hardware::SerialLink;
use garagelink_protocol::{InboundMessage, StreamEvent, StreamParser};

use crate::config::DriverConfig;
use crate::state_machine::{DriverEvent, DriverSnapshot, GarageDoor, RequestOutcome};

/// Read chunk size per link poll. Larger than any frame burst a tick can
/// plausibly carry at garage-controller baud rates.
const READ_CHUNK: usize = 256;

/// Capacity of the request channel.
const REQUEST_QUEUE: usize = 32;

/// Capacity of the event broadcast channel. Slow subscribers that fall
/// further behind than this see a `Lagged` error, not backpressure.
const EVENT_QUEUE: usize = 64;

/// Requests crossing from handles into the service task.
#[derive(Debug)]
enum DriverRequest {
    SetSwitch {
        switch: SwitchKind,
        value: bool,
        reply: oneshot::Sender<Result<RequestOutcome>>,
    },
    QueryStatus,
}

/// Cloneable handle to a running [`DriverService`].
#[derive(Debug, Clone)]
pub struct DriverHandle {
    requests: mpsc::Sender<DriverRequest>,
    events: broadcast::Sender<DriverEvent>,
    snapshot: watch::Receiver<DriverSnapshot>,
}

impl DriverHandle {
    /// Request a switch change and wait for the queueing decision.
    ///
    /// Resolves as soon as the state machine accepts or rejects the
    /// request; acknowledgment from the controller arrives later as a
    /// [`DriverEvent::SwitchConfirmed`] or
    /// [`DriverEvent::SwitchCommandFailed`] event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SwitchBusy`] in strict single-flight mode, or
    /// [`Error::LinkClosed`] if the service task has shut down.
    pub async fn set_switch(&self, switch: SwitchKind, value: bool) -> Result<RequestOutcome> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(DriverRequest::SetSwitch {
                switch,
                value,
                reply,
            })
            .await
            .map_err(|_| Error::LinkClosed)?;
        response.await.map_err(|_| Error::LinkClosed)?
    }

    /// Ask the controller for an immediate status report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LinkClosed`] if the service task has shut down.
    pub async fn query_status(&self) -> Result<()> {
        self.requests
            .send(DriverRequest::QueryStatus)
            .await
            .map_err(|_| Error::LinkClosed)
    }

    /// Subscribe to state-change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DriverEvent> {
        self.events.subscribe()
    }

    /// Latest device snapshot.
    #[must_use]
    pub fn snapshot(&self) -> DriverSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait until the snapshot changes, then return it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LinkClosed`] if the service task has shut down.
    pub async fn changed(&mut self) -> Result<DriverSnapshot> {
        self.snapshot.changed().await.map_err(|_| Error::LinkClosed)?;
        Ok(self.snapshot.borrow().clone())
    }
}

/// Tokio task driving a [`GarageDoor`] over a [`SerialLink`].
pub struct DriverService;

impl DriverService {
    /// Spawn the service on the current runtime.
    ///
    /// Returns a handle for callers and the join handle of the service
    /// task. The task runs until all handles are dropped or the link
    /// fails fatally; in the latter case the join handle resolves to
    /// [`Error::LinkClosed`].
    pub fn spawn<L>(link: L, config: DriverConfig) -> (DriverHandle, JoinHandle<Result<()>>)
    where
        L: SerialLink + 'static,
    {
        let machine = GarageDoor::new(config);
        let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE);
        let (event_tx, _) = broadcast::channel(EVENT_QUEUE);
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());

        let handle = DriverHandle {
            requests: request_tx,
            events: event_tx.clone(),
            snapshot: snapshot_rx,
        };

        let task = tokio::spawn(run(link, machine, request_rx, event_tx, snapshot_tx));

        (handle, task)
    }
}

async fn run<L: SerialLink>(
    mut link: L,
    mut machine: GarageDoor,
    mut requests: mpsc::Receiver<DriverRequest>,
    events: broadcast::Sender<DriverEvent>,
    snapshot: watch::Sender<DriverSnapshot>,
) -> Result<()> {
    info!(link = link.name(), "driver service started");

    let mut parser = StreamParser::new();
    let mut read_buf = [0u8; READ_CHUNK];
    let mut interval = tokio::time::interval(machine.config().tick_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = tokio::time::Instant::now().into_std();

                if let Err(e) = pump_link(&mut link, &mut parser, &mut machine, &mut read_buf, now) {
                    error!(link = link.name(), error = %e, "serial link failed");
                    return Err(e);
                }
                machine.tick(now);
            }
            request = requests.recv() => {
                let Some(request) = request else {
                    info!(link = link.name(), "all handles dropped, stopping driver service");
                    return Ok(());
                };
                let now = tokio::time::Instant::now().into_std();
                handle_request(&mut machine, request, now);
            }
        }

        flush_outbox(&mut link, &mut machine)?;

        while let Some(event) = machine.pop_event() {
            debug!(?event, "driver event");
            // Send only fails when nobody is subscribed; that is fine.
            let _ = events.send(event);
        }

        snapshot.send_if_modified(|current| {
            let fresh = machine.snapshot();
            if *current == fresh {
                false
            } else {
                *current = fresh;
                true
            }
        });
    }
}

/// Drain available link bytes through the parser into the state machine.
fn pump_link<L: SerialLink>(
    link: &mut L,
    parser: &mut StreamParser,
    machine: &mut GarageDoor,
    buf: &mut [u8],
    now: std::time::Instant,
) -> Result<()> {
    loop {
        let n = match link.poll_read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.is_fatal() => return Err(Error::LinkClosed),
            Err(e) => {
                warn!(error = %e, "transient link read error");
                break;
            }
        };
        parser.feed(&buf[..n]);
    }

    while let Some(event) = parser.next_event() {
        match event {
            StreamEvent::Frame(frame) => match InboundMessage::try_from(&frame) {
                Ok(msg) => machine.on_message(msg, now),
                Err(e) => warn!(error = %e, %frame, "undecodable frame"),
            },
            StreamEvent::Error(e) => warn!(error = %e, "link stream error"),
        }
    }
    Ok(())
}

fn handle_request(machine: &mut GarageDoor, request: DriverRequest, now: std::time::Instant) {
    match request {
        DriverRequest::SetSwitch {
            switch,
            value,
            reply,
        } => {
            let outcome = machine.request_switch(switch, value, now);
            // The caller may have given up waiting; that is fine.
            let _ = reply.send(outcome);
        }
        DriverRequest::QueryStatus => {
            machine.queue_status_query();
        }
    }
}

fn flush_outbox<L: SerialLink>(link: &mut L, machine: &mut GarageDoor) -> Result<()> {
    while let Some(cmd) = machine.pop_command() {
        let wire = cmd.to_frame().to_wire();
        match link.write_all(&wire) {
            Ok(()) => debug!(?cmd, "command written"),
            Err(e) if e.is_fatal() => {
                error!(error = %e, "link lost while writing");
                return Err(Error::LinkClosed);
            }
            Err(e) => {
                // Leave recovery to the retransmit timer.
                warn!(error = %e, ?cmd, "transient link write error, command dropped");
            }
        }
    }
    Ok(())
}
