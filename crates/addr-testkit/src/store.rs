use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use addr_reconcile::{DocumentStore, Mutator, StoreError};
use addr_schemas::RawDocument;

/// Call counters observed by tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub get: usize,
    pub post: usize,
    pub update: usize,
    /// Updates that actually replaced a stored document.
    pub writes: usize,
    pub delete: usize,
}

#[derive(Default)]
struct Inner {
    documents: BTreeMap<String, RawDocument>,
    next_version: u64,
    post_codes: VecDeque<u16>,
    update_codes: VecDeque<u16>,
    fail_updates: Option<StoreError>,
    fail_deletes: Option<StoreError>,
    calls: StoreCalls,
}

impl Inner {
    fn bump(&mut self, doc: &mut RawDocument) {
        self.next_version += 1;
        doc.metadata.resource_version = Some(self.next_version.to_string());
    }
}

/// In-memory document store.
///
/// - `post` answers 201 for new names and 409 for existing ones unless a code
///   was scripted with [`InMemoryStore::script_post`].
/// - `update` runs the mutator against the stored copy: 304 when it declines,
///   200 after writing, 404 for unknown names. A code scripted with
///   [`InMemoryStore::script_update`] is returned instead and nothing is written.
/// - Every stored document carries a fresh `resourceVersion`.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(docs: impl IntoIterator<Item = RawDocument>) -> Self {
        let store = Self::new();
        for doc in docs {
            store.insert(doc);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a document, as the controller would.
    pub fn insert(&self, mut doc: RawDocument) {
        let mut inner = self.lock();
        inner.bump(&mut doc);
        inner.documents.insert(doc.name().to_string(), doc);
    }

    pub fn remove(&self, name: &str) -> Option<RawDocument> {
        self.lock().documents.remove(name)
    }

    pub fn document(&self, name: &str) -> Option<RawDocument> {
        self.lock().documents.get(name).cloned()
    }

    /// Every stored document, ordered by name.
    pub fn snapshot(&self) -> Vec<RawDocument> {
        self.lock().documents.values().cloned().collect()
    }

    pub fn script_post(&self, code: u16) {
        self.lock().post_codes.push_back(code);
    }

    pub fn script_update(&self, code: u16) {
        self.lock().update_codes.push_back(code);
    }

    /// Make every subsequent update fail with `err`. `None` clears it.
    pub fn fail_updates(&self, err: Option<StoreError>) {
        self.lock().fail_updates = err;
    }

    /// Make every subsequent delete fail with `err`. `None` clears it.
    pub fn fail_deletes(&self, err: Option<StoreError>) {
        self.lock().fail_deletes = err;
    }

    pub fn calls(&self) -> StoreCalls {
        self.lock().calls
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, selector: &str) -> Result<Vec<RawDocument>, StoreError> {
        let mut inner = self.lock();
        inner.calls.get += 1;
        let (key, value) = selector.split_once('=').unwrap_or((selector, ""));
        Ok(inner
            .documents
            .values()
            .filter(|doc| doc.metadata.labels.get(key).map(String::as_str) == Some(value))
            .cloned()
            .collect())
    }

    async fn post(&self, document: &RawDocument) -> Result<u16, StoreError> {
        let mut inner = self.lock();
        inner.calls.post += 1;
        if let Some(code) = inner.post_codes.pop_front() {
            return Ok(code);
        }
        if inner.documents.contains_key(document.name()) {
            return Ok(409);
        }
        let mut doc = document.clone();
        inner.bump(&mut doc);
        inner.documents.insert(doc.name().to_string(), doc);
        Ok(201)
    }

    async fn update(&self, name: &str, mutate: &Mutator) -> Result<u16, StoreError> {
        let mut inner = self.lock();
        inner.calls.update += 1;
        if let Some(err) = inner.fail_updates.clone() {
            return Err(err);
        }
        if let Some(code) = inner.update_codes.pop_front() {
            return Ok(code);
        }
        let Some(current) = inner.documents.get(name).cloned() else {
            return Ok(404);
        };
        let Some(mut next) = mutate(current)? else {
            return Ok(304);
        };
        inner.bump(&mut next);
        inner.documents.insert(name.to_string(), next);
        inner.calls.writes += 1;
        Ok(200)
    }

    async fn delete_resource(&self, name: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.calls.delete += 1;
        if let Some(err) = inner.fail_deletes.clone() {
            return Err(err);
        }
        match inner.documents.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::Status {
                code: 404,
                message: format!("document '{name}' not found"),
            }),
        }
    }
}
