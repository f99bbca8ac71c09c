//! PollingWatcher delivers the first list and then only changed lists.

use std::sync::Arc;
use std::time::Duration;

use addr_reconcile::DocumentStore;
use addr_schemas::ADDRESS_CONFIG_SELECTOR;
use addr_store::{HttpStore, PollingWatcher};
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn unchanged_list_is_delivered_once() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/namespaces/ns/configmaps");
            then.status(200).json_body(json!({
                "items": [
                    {"metadata": {"name": "b", "resourceVersion": "2"}, "data": {}},
                    {"metadata": {"name": "a", "resourceVersion": "1"}, "data": {}}
                ]
            }));
        })
        .await;

    let store: Arc<dyn DocumentStore> = Arc::new(HttpStore::new(server.base_url(), "ns"));
    let mut rx = PollingWatcher::spawn(store, ADDRESS_CONFIG_SELECTOR, Duration::from_millis(10));

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("first batch")
        .expect("channel open");
    let names: Vec<_> = first.iter().map(|d| d.name()).collect();
    assert_eq!(names, ["a", "b"]);

    let second = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(second.is_err(), "identical list must not be re-delivered");
    assert!(list.hits_async().await >= 2);
}

#[tokio::test]
async fn failing_list_is_retried() {
    let server = MockServer::start_async().await;
    let failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/namespaces/ns/configmaps");
            then.status(500);
        })
        .await;

    let store: Arc<dyn DocumentStore> = Arc::new(HttpStore::new(server.base_url(), "ns"));
    let mut rx = PollingWatcher::spawn(store, ADDRESS_CONFIG_SELECTOR, Duration::from_millis(10));

    let got = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(got.is_err(), "failed lists deliver nothing");
    assert!(failing.hits_async().await >= 2);
}
