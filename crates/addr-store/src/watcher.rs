//! Poll-based watch source.
//!
//! Lists the selector on a fixed interval and forwards the full list whenever
//! it differs from the last one delivered. The first successful list is
//! always delivered, even when empty.

use std::sync::Arc;
use std::time::Duration;

use addr_reconcile::DocumentStore;
use addr_schemas::RawDocument;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Batches buffered before the poller waits on the consumer.
const WATCH_BUFFER: usize = 8;

pub struct PollingWatcher;

impl PollingWatcher {
    /// Spawn the poll loop. It stops once the returned receiver is dropped.
    pub fn spawn(
        store: Arc<dyn DocumentStore>,
        selector: impl Into<String>,
        interval: Duration,
    ) -> mpsc::Receiver<Vec<RawDocument>> {
        let selector = selector.into();
        let (tx, rx) = mpsc::channel(WATCH_BUFFER);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Vec<RawDocument>> = None;

            loop {
                ticker.tick().await;
                let mut docs = match store.get(&selector).await {
                    Ok(docs) => docs,
                    Err(e) => {
                        warn!(selector = %selector, error = %e, "watch list failed");
                        continue;
                    }
                };
                docs.sort_by(|a, b| a.name().cmp(b.name()));
                if last.as_ref() == Some(&docs) {
                    continue;
                }
                debug!(selector = %selector, count = docs.len(), "watch delivering batch");
                last = Some(docs.clone());
                if tx.send(docs).await.is_err() {
                    debug!(selector = %selector, "watch receiver dropped; stopping");
                    break;
                }
            }
        });

        rx
    }
}
