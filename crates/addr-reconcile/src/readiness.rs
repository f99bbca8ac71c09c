//! Readiness side-table.
//!
//! Maps address → last confirmed readiness. Records are created lazily with
//! `ready = false` and never removed: the table grows with the number of
//! distinct addresses ever seen by the process. A stale record for a deleted
//! address is harmless because no propagation stat will ever name it again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessRecord {
    pub address: String,
    /// Store key of the document backing this address.
    pub name: String,
    pub ready: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ReadinessTracker {
    records: BTreeMap<String, ReadinessRecord>,
}

impl ReadinessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a not-ready record for every address not yet tracked.
    ///
    /// Entries are `(address, document name)`; the first name seen for an
    /// address wins.
    pub fn track<I, A, N>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (A, N)>,
        A: Into<String>,
        N: Into<String>,
    {
        for (address, name) in entries {
            let address = address.into();
            self.records
                .entry(address.clone())
                .or_insert_with(|| ReadinessRecord {
                    address,
                    name: name.into(),
                    ready: false,
                });
        }
    }

    pub fn get(&self, address: &str) -> Option<&ReadinessRecord> {
        self.records.get(address)
    }

    /// Record a confirmed readiness value. Returns `false` if untracked.
    pub fn mark(&mut self, address: &str, ready: bool) -> bool {
        match self.records.get_mut(address) {
            Some(record) => {
                record.ready = ready;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReadinessRecord> {
        self.records.values()
    }
}
