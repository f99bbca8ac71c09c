//! Store boundary.
//!
//! The engine reads and writes documents only through [`DocumentStore`].
//! Implementations must be object-safe and `Send + Sync` so a source can hold
//! an `Arc<dyn DocumentStore>` across async task boundaries.

use addr_schemas::RawDocument;

use crate::StoreError;

/// Fetch-modify-write callback passed to [`DocumentStore::update`].
///
/// Receives the current document. `Ok(Some(doc))` asks the store to write
/// `doc` under optimistic concurrency; `Ok(None)` means no write is needed.
pub type Mutator = dyn Fn(RawDocument) -> Result<Option<RawDocument>, StoreError> + Send + Sync;

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// List every document matching a label selector (`key=value`).
    async fn get(&self, selector: &str) -> Result<Vec<RawDocument>, StoreError>;

    /// Create a document. Returns the store's status code.
    async fn post(&self, document: &RawDocument) -> Result<u16, StoreError>;

    /// Conditionally rewrite the named document.
    ///
    /// Returns 200 when a write was applied and 304 when the mutator declined
    /// to write. Any other code is a store-side refusal.
    async fn update(&self, name: &str, mutate: &Mutator) -> Result<u16, StoreError>;

    /// Delete the named document.
    async fn delete_resource(&self, name: &str) -> Result<(), StoreError>;
}
