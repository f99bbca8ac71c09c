//! addr-store
//!
//! REST-backed [`DocumentStore`] and a polling watcher that turns periodic
//! list calls into full-snapshot batches for the dispatch engine.

mod http_store;
mod watcher;

pub use http_store::HttpStore;
pub use watcher::PollingWatcher;

pub use addr_reconcile::{DocumentStore, Mutator, StoreError};
