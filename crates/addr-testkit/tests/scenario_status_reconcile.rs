//! Status reconciler: propagation stats drive readiness write-back.
//!
//! GREEN when:
//! - repeated calls converge, one store write per call,
//! - a refused or failed write leaves the tracked readiness untouched,
//! - a 304 (already correct in the store) still confirms the tracked value,
//! - tracked addresses survive removal from the watch list.

use std::sync::Arc;

use addr_reconcile::{AddressSource, StoreError, WriteBack};
use addr_schemas::{AddressDocument, AddressStatus, Phase, ADDRESS_CONFIG_KEY};
use addr_testkit::{address_doc, stats, InMemoryStore};

fn setup(docs: Vec<addr_schemas::RawDocument>) -> (Arc<InMemoryStore>, AddressSource) {
    let store = Arc::new(InMemoryStore::with_documents(docs));
    let mut src = AddressSource::new("default", store.clone());
    src.on_watch_update(store.snapshot());
    (store, src)
}

fn pending() -> Option<AddressStatus> {
    Some(AddressStatus::new(false, Phase::Pending))
}

fn stored_status(store: &InMemoryStore, name: &str) -> AddressStatus {
    let doc = store.document(name).unwrap();
    let payload: AddressDocument =
        serde_json::from_str(doc.data.get(ADDRESS_CONFIG_KEY).unwrap()).unwrap();
    payload.status.unwrap()
}

#[tokio::test]
async fn converges_with_one_write_per_call() {
    let (store, mut src) = setup(vec![
        address_doc("cm-a", "a", pending()),
        address_doc("cm-b", "b", pending()),
    ]);
    let full = stats(&[("a", 100.0), ("b", 100.0)]);

    let first = src.check_status(&full).await.unwrap();
    assert_eq!(first, WriteBack::Applied { address: "a".into(), ready: true });
    assert_eq!(store.calls().update, 1);

    let second = src.check_status(&full).await.unwrap();
    assert_eq!(second, WriteBack::Applied { address: "b".into(), ready: true });
    assert_eq!(store.calls().update, 2);

    assert!(src.check_status(&full).await.is_none());
    assert_eq!(store.calls().update, 2);
    assert_eq!(store.calls().writes, 2);

    let status = stored_status(&store, "cm-a");
    assert_eq!(status.is_ready, Some(true));
    assert_eq!(status.phase, Some(Phase::Active));

    src.on_watch_update(store.snapshot());
    let ready: Vec<_> = src.addresses_ready().iter().map(|d| d.address.as_str()).collect();
    assert_eq!(ready, ["a", "b"]);
}

#[tokio::test]
async fn partial_propagation_is_not_ready() {
    let (store, mut src) = setup(vec![address_doc("cm-a", "a", pending())]);
    assert!(src.check_status(&stats(&[("a", 99.5)])).await.is_none());
    assert_eq!(store.calls().update, 0);
}

#[tokio::test]
async fn refused_write_keeps_tracked_value_and_retries() {
    let (store, mut src) = setup(vec![
        address_doc("cm-a", "a", pending()),
        address_doc("cm-b", "b", pending()),
    ]);
    let full = stats(&[("a", 100.0), ("b", 100.0)]);

    store.script_update(500);
    let out = src.check_status(&full).await.unwrap();
    assert_eq!(out, WriteBack::Rejected { address: "a".into(), code: 500 });
    assert!(!src.readiness().get("a").unwrap().ready);

    // Same address is first in line again.
    let out = src.check_status(&full).await.unwrap();
    assert_eq!(out.address(), "a");
    assert!(out.is_confirmed());
    assert!(src.readiness().get("a").unwrap().ready);
}

#[tokio::test]
async fn transport_failure_keeps_tracked_value() {
    let (store, mut src) = setup(vec![address_doc("cm-a", "a", pending())]);
    store.fail_updates(Some(StoreError::Transport("connection reset".into())));

    let out = src.check_status(&stats(&[("a", 100.0)])).await.unwrap();
    assert!(matches!(out, WriteBack::Failed { ref message, .. } if message.contains("connection reset")));
    assert!(!src.readiness().get("a").unwrap().ready);
    assert_eq!(stored_status(&store, "cm-a").is_ready, Some(false));
}

#[tokio::test]
async fn already_correct_store_confirms_with_304() {
    let (store, mut src) = setup(vec![address_doc(
        "cm-a",
        "a",
        Some(AddressStatus::new(true, Phase::Active)),
    )]);

    let out = src.check_status(&stats(&[("a", 100.0)])).await.unwrap();
    assert_eq!(out, WriteBack::Unchanged { address: "a".into(), ready: true });
    assert!(src.readiness().get("a").unwrap().ready);
    assert_eq!(store.calls().writes, 0);
}

#[tokio::test]
async fn lost_propagation_marks_address_pending() {
    let (store, mut src) = setup(vec![address_doc("cm-a", "a", pending())]);
    src.check_status(&stats(&[("a", 100.0)])).await.unwrap();

    let out = src.check_status(&stats(&[("a", 40.0)])).await.unwrap();
    assert_eq!(out, WriteBack::Applied { address: "a".into(), ready: false });
    let status = stored_status(&store, "cm-a");
    assert_eq!(status.is_ready, Some(false));
    assert_eq!(status.phase, Some(Phase::Pending));
}

#[tokio::test]
async fn tracker_never_forgets_and_keeps_first_name() {
    let (store, mut src) = setup(vec![address_doc("cm-a", "a", pending())]);

    store.remove("cm-a");
    src.on_watch_update(store.snapshot());
    assert!(src.addresses_defined().is_empty());
    assert_eq!(src.readiness().len(), 1);

    store.insert(address_doc("cm-a-2", "a", pending()));
    src.on_watch_update(store.snapshot());
    assert_eq!(src.readiness().get("a").unwrap().name, "cm-a");
}

#[tokio::test]
async fn recreated_address_writes_back_to_its_first_name() {
    let (store, mut src) = setup(vec![address_doc("cm-a", "a", pending())]);
    store.remove("cm-a");
    store.insert(address_doc("cm-a-2", "a", pending()));
    src.on_watch_update(store.snapshot());

    let out = src.check_status(&stats(&[("a", 100.0)])).await.unwrap();
    assert_eq!(out, WriteBack::Rejected { address: "a".into(), code: 404 });
    assert_eq!(stored_status(&store, "cm-a-2").is_ready, Some(false));
}

#[tokio::test]
async fn write_back_to_vanished_document_is_rejected() {
    let (store, mut src) = setup(vec![address_doc("cm-a", "a", pending())]);
    store.remove("cm-a");

    let out = src.check_status(&stats(&[("a", 100.0)])).await.unwrap();
    assert_eq!(out, WriteBack::Rejected { address: "a".into(), code: 404 });
}
