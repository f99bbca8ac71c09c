//! Shared runtime state for addr-daemon.
//!
//! The [`AddressSource`] is owned by a single tokio mutex: watch batches,
//! status checks and mutations are serialized through it.

use std::sync::Arc;
use std::time::Duration;

use addr_reconcile::{AddressEvent, AddressSource};
use addr_schemas::RawDocument;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// BusMsg — SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Address(AddressEvent),
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub address_space: String,
    pub source: Arc<Mutex<AddressSource>>,
}

impl AppState {
    pub fn new(source: AddressSource) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "addr-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            address_space: source.address_space().to_string(),
            source: Arc::new(Mutex::new(source)),
        }
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}

/// Forward address view changes onto the SSE bus.
///
/// Subscribe to the source before it is moved into [`AppState`].
pub fn spawn_address_relay(
    mut events: broadcast::Receiver<AddressEvent>,
    bus: broadcast::Sender<BusMsg>,
) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ev) => {
                    let _ = bus.send(BusMsg::Address(ev));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "address relay lagged");
                    let _ = bus.send(BusMsg::LogLine {
                        level: "WARN".to_string(),
                        msg: format!("address relay dropped {skipped} event(s)"),
                    });
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Feed watch batches into the source, one at a time, until the watcher stops.
pub fn spawn_dispatch(state: Arc<AppState>, mut batches: mpsc::Receiver<Vec<RawDocument>>) {
    tokio::spawn(async move {
        while let Some(batch) = batches.recv().await {
            let outcome = state.source.lock().await.on_watch_update(batch);
            if outcome.is_noop() {
                debug!("watch batch changed nothing");
            }
        }
        warn!("watch channel closed; dispatch stopped");
    });
}
