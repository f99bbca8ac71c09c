//! AddressSource: dispatch engine, status reconciler and mutation API for one
//! address space.
//!
//! # Invariants
//!
//! - **One batch at a time**: [`AddressSource::on_watch_update`] takes
//!   `&mut self` and never suspends, so a batch is fully processed before the
//!   next one is looked at.
//! - **Retained == dispatched**: each view's retained snapshot is exactly the
//!   last snapshot published for it, replaced only when a change is detected.
//! - **Bounded write-back**: [`AddressSource::check_status`] performs at most
//!   one store update per call.

use std::sync::Arc;

use addr_schemas::{
    AddressDefinition, AddressSpec, AddressType, PropagationStats, RawDocument,
    ADDRESS_PLAN_SELECTOR,
};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::diff::{by_address, changed, same_address_definition, same_address_definition_and_status};
use crate::extract::{extract, extract_address_only, extract_definition, is_ready};
use crate::mutation::address_config_document;
use crate::plans::{group_plans, parse_plan};
use crate::readiness::{ReadinessRecord, ReadinessTracker};
use crate::status::{apply_readiness, WriteBack};
use crate::{
    status_text, AddressEvent, CatalogError, ChangeSummary, DocumentStore, MutationError,
    StoreError,
};

/// Broadcast buffer used by [`AddressSource::new`].
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// What one watch batch changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub defined: Option<ChangeSummary>,
    pub ready: Option<ChangeSummary>,
}

impl DispatchOutcome {
    pub fn is_noop(&self) -> bool {
        self.defined.is_none() && self.ready.is_none()
    }
}

pub struct AddressSource {
    address_space: String,
    store: Arc<dyn DocumentStore>,
    events: broadcast::Sender<AddressEvent>,
    readiness: ReadinessTracker,
    addresses_defined: Vec<AddressDefinition>,
    addresses_ready: Vec<AddressDefinition>,
}

impl AddressSource {
    pub fn new(address_space: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
        Self::with_event_capacity(address_space, store, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(
        address_space: impl Into<String>,
        store: Arc<dyn DocumentStore>,
        capacity: usize,
    ) -> Self {
        let (events, _rx) = broadcast::channel(capacity.max(1));
        Self {
            address_space: address_space.into(),
            store,
            events,
            readiness: ReadinessTracker::new(),
            addresses_defined: Vec::new(),
            addresses_ready: Vec::new(),
        }
    }

    pub fn address_space(&self) -> &str {
        &self.address_space
    }

    /// Register a listener for `addresses_defined` / `addresses_ready`.
    pub fn subscribe(&self) -> broadcast::Receiver<AddressEvent> {
        self.events.subscribe()
    }

    /// Last dispatched snapshot of every defined address.
    pub fn addresses_defined(&self) -> &[AddressDefinition] {
        &self.addresses_defined
    }

    /// Last dispatched snapshot of ready addresses.
    pub fn addresses_ready(&self) -> &[AddressDefinition] {
        &self.addresses_ready
    }

    pub fn readiness(&self) -> &ReadinessTracker {
        &self.readiness
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Process the full current document list delivered by the watcher.
    pub fn on_watch_update(&mut self, mut documents: Vec<RawDocument>) -> DispatchOutcome {
        documents.sort_by(|a, b| a.name().cmp(b.name()));
        debug!(count = documents.len(), "addresses updated: {:?}", documents);

        self.update_readiness(&documents);

        let parsed: Vec<_> = documents.iter().filter_map(extract).collect();

        let mut defined: Vec<AddressDefinition> =
            parsed.iter().filter_map(extract_definition).collect();
        defined.sort_by(|a, b| a.address.cmp(&b.address));

        let mut ready: Vec<AddressDefinition> = parsed
            .iter()
            .filter(|def| is_ready(def))
            .filter_map(extract_definition)
            .collect();
        ready.sort_by(|a, b| a.address.cmp(&b.address));

        let defined = dispatch(
            "addresses_defined",
            &mut self.addresses_defined,
            defined,
            same_address_definition_and_status,
            &self.events,
            AddressEvent::AddressesDefined,
        );
        let ready = dispatch(
            "addresses_ready",
            &mut self.addresses_ready,
            ready,
            same_address_definition,
            &self.events,
            AddressEvent::AddressesReady,
        );
        DispatchOutcome { defined, ready }
    }

    fn update_readiness(&mut self, documents: &[RawDocument]) {
        self.readiness.track(
            documents
                .iter()
                .filter_map(|doc| extract_address_only(doc).map(|a| (a, doc.name().to_string()))),
        );
    }

    // -----------------------------------------------------------------------
    // Status reconciliation
    // -----------------------------------------------------------------------

    /// Compare observed propagation with tracked readiness and correct the
    /// first divergence found.
    ///
    /// Addresses are visited in ascending order and only the first mismatch is
    /// written back; the rest wait for the next call. Returns `None` when
    /// every tracked address already agrees with its stats.
    pub async fn check_status(&mut self, stats: &PropagationStats) -> Option<WriteBack> {
        let (record, ready) = stats.iter().find_map(|(address, stat)| {
            let record = self.readiness.get(address)?;
            let ready = stat.is_fully_propagated();
            (record.ready != ready).then(|| (record.clone(), ready))
        })?;

        let outcome = self.update_status(&record, ready).await;
        if outcome.is_confirmed() {
            self.readiness.mark(&record.address, ready);
        }
        Some(outcome)
    }

    async fn update_status(&self, record: &ReadinessRecord, ready: bool) -> WriteBack {
        let mutate = move |doc: RawDocument| apply_readiness(doc, ready);
        let address = record.address.clone();
        match self.store.update(&record.name, &mutate).await {
            Ok(200) => {
                info!(address = %record.address, name = %record.name, ready, "updated status");
                WriteBack::Applied { address, ready }
            }
            Ok(304) => {
                debug!(address = %record.address, name = %record.name, ready, "no need to update status");
                WriteBack::Unchanged { address, ready }
            }
            Ok(code) => {
                error!(address = %record.address, name = %record.name, ready, code, "failed to update status");
                WriteBack::Rejected { address, code }
            }
            Err(e) => {
                error!(address = %record.address, name = %record.name, ready, error = %e, "failed to update status");
                WriteBack::Failed {
                    address,
                    message: e.to_string(),
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Mutation API
    // -----------------------------------------------------------------------

    /// Submit a new address document keyed by the address string.
    pub async fn create_address(&self, spec: &AddressSpec) -> Result<(), MutationError> {
        let doc = address_config_document(&self.address_space, spec)?;
        let code = self.store.post(&doc).await?;
        if code >= 300 {
            let definition =
                serde_json::to_string(spec).map_err(|e| MutationError::Encode(e.to_string()))?;
            let err = MutationError::Rejected {
                definition,
                code,
                reason: status_text(code).to_string(),
            };
            error!(address = %spec.address, code, "{}", err);
            return Err(err);
        }
        info!(address = %spec.address, name = doc.name(), "created address");
        Ok(())
    }

    /// Remove the document backing `definition`.
    pub async fn delete_address(&self, definition: &AddressDefinition) -> Result<(), StoreError> {
        self.store.delete_resource(&definition.name).await?;
        info!(address = %definition.address, name = %definition.name, "deleted address");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Plan catalog
    // -----------------------------------------------------------------------

    /// Address types with their plans, in display order.
    pub async fn list_address_types(&self) -> Result<Vec<AddressType>, CatalogError> {
        let docs = self.store.get(ADDRESS_PLAN_SELECTOR).await?;
        let plans = docs.iter().map(parse_plan).collect::<Result<Vec<_>, _>>()?;
        Ok(group_plans(plans))
    }
}

fn dispatch(
    view: &'static str,
    retained: &mut Vec<AddressDefinition>,
    current: Vec<AddressDefinition>,
    equivalent: fn(&AddressDefinition, &AddressDefinition) -> bool,
    events: &broadcast::Sender<AddressEvent>,
    event: fn(Vec<AddressDefinition>) -> AddressEvent,
) -> Option<ChangeSummary> {
    let summary = changed(retained.as_slice(), &current, equivalent, by_address)?;
    info!(view, "{}: {}", view, summary.description);
    *retained = current;
    // No listeners is not an error.
    let _ = events.send(event(retained.clone()));
    Some(summary)
}
