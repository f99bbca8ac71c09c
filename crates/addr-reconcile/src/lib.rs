//! addr-reconcile
//!
//! Address reconciliation engine.
//!
//! Architectural decisions:
//! - The store delivers full snapshots; the engine diffs, it never patches
//! - Two derived views: every defined address, and only the ready ones
//! - Listeners receive whole snapshots, and only when something changed
//! - One corrective status write per reconciliation pass
//! - A failed write leaves tracked readiness untouched so the next pass retries
//!
//! All store access goes through [`DocumentStore`]; nothing here knows about
//! HTTP, polling or process wiring.

mod diff;
mod extract;
mod mutation;
mod naming;
mod plans;
mod readiness;
mod source;
mod status;
mod store;
mod types;

pub use diff::{
    by_address, changed, describe, same_address_definition, same_address_definition_and_status,
    ChangeSummary,
};
pub use extract::{extract, extract_address_only, extract_definition, is_ready};
pub use mutation::address_config_document;
pub use naming::resource_name;
pub use plans::{group_plans, parse_plan};
pub use readiness::{ReadinessRecord, ReadinessTracker};
pub use source::{AddressSource, DispatchOutcome, DEFAULT_EVENT_CAPACITY};
pub use status::{apply_readiness, WriteBack};
pub use store::{DocumentStore, Mutator};
pub use types::*;
