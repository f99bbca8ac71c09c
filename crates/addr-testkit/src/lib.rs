//! Test-only collaborators for the address agent.
//!
//! [`InMemoryStore`] stands in for the document store; the builders in
//! [`docs`] produce store documents in the shapes the controller writes.

pub mod docs;
mod store;

pub use docs::{address_doc, address_doc_allocated, plan_doc, stats};
pub use store::{InMemoryStore, StoreCalls};
