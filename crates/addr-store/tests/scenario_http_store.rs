//! HttpStore against a mocked configmap API.

use addr_reconcile::{apply_readiness, DocumentStore, StoreError};
use addr_schemas::{RawDocument, ADDRESS_CONFIG_KEY, ADDRESS_CONFIG_SELECTOR};
use addr_store::HttpStore;
use httpmock::prelude::*;
use serde_json::json;

const COLLECTION: &str = "/api/v1/namespaces/enmasse/configmaps";

fn configmap(name: &str, address: &str, ready: bool) -> serde_json::Value {
    let payload = json!({
        "metadata": {"name": name},
        "spec": {"address": address, "type": "queue", "plan": "standard"},
        "status": {"isReady": ready, "phase": if ready { "Active" } else { "Pending" }}
    });
    json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": name,
            "labels": {"type": "address-config"},
            "resourceVersion": "41"
        },
        "data": {ADDRESS_CONFIG_KEY: payload.to_string()}
    })
}

#[tokio::test]
async fn get_lists_by_label_selector_with_bearer_token() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(COLLECTION)
                .query_param("labelSelector", ADDRESS_CONFIG_SELECTOR)
                .header("authorization", "Bearer test-token");
            then.status(200)
                .json_body(json!({"items": [configmap("cm-q1", "q1", true)]}));
        })
        .await;

    let store = HttpStore::new(server.base_url(), "enmasse")
        .with_token(addr_config::StoreToken::new("test-token"));
    let docs = store.get(ADDRESS_CONFIG_SELECTOR).await.unwrap();

    list.assert_async().await;
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].name(), "cm-q1");
    assert_eq!(docs[0].metadata.resource_version.as_deref(), Some("41"));
}

#[tokio::test]
async fn get_non_success_is_status_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(COLLECTION);
            then.status(403).body("forbidden");
        })
        .await;

    let store = HttpStore::new(server.base_url(), "enmasse");
    let err = store.get(ADDRESS_CONFIG_SELECTOR).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::Status {
            code: 403,
            message: "forbidden".to_string()
        }
    );
}

#[tokio::test]
async fn post_returns_store_code_verbatim() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(COLLECTION)
                .json_body_partial(r#"{"metadata":{"name":"q2"}}"#);
            then.status(409);
        })
        .await;

    let store = HttpStore::new(server.base_url(), "enmasse");
    let code = store.post(&RawDocument::new("q2")).await.unwrap();
    create.assert_async().await;
    assert_eq!(code, 409);
}

#[tokio::test]
async fn update_writes_mutated_document() {
    let server = MockServer::start_async().await;
    let read = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{COLLECTION}/cm-q1"));
            then.status(200).json_body(configmap("cm-q1", "q1", false));
        })
        .await;
    let write = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("{COLLECTION}/cm-q1"))
                .json_body_partial(r#"{"metadata":{"name":"cm-q1","resourceVersion":"41"}}"#);
            then.status(200);
        })
        .await;

    let store = HttpStore::new(server.base_url(), "enmasse");
    let mutate = |doc: RawDocument| apply_readiness(doc, true);
    let code = store.update("cm-q1", &mutate).await.unwrap();

    assert_eq!(code, 200);
    read.assert_async().await;
    write.assert_async().await;
}

#[tokio::test]
async fn update_skips_write_when_mutator_declines() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{COLLECTION}/cm-q1"));
            then.status(200).json_body(configmap("cm-q1", "q1", true));
        })
        .await;
    let write = server
        .mock_async(|when, then| {
            when.method(PUT).path(format!("{COLLECTION}/cm-q1"));
            then.status(200);
        })
        .await;

    let store = HttpStore::new(server.base_url(), "enmasse");
    let mutate = |doc: RawDocument| apply_readiness(doc, true);
    let code = store.update("cm-q1", &mutate).await.unwrap();

    assert_eq!(code, 304);
    assert_eq!(write.hits_async().await, 0);
}

#[tokio::test]
async fn update_conflict_is_retried_then_reported() {
    let server = MockServer::start_async().await;
    let read = server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{COLLECTION}/cm-q1"));
            then.status(200).json_body(configmap("cm-q1", "q1", false));
        })
        .await;
    let write = server
        .mock_async(|when, then| {
            when.method(PUT).path(format!("{COLLECTION}/cm-q1"));
            then.status(409);
        })
        .await;

    let store = HttpStore::new(server.base_url(), "enmasse").with_conflict_retries(2);
    let mutate = |doc: RawDocument| apply_readiness(doc, true);
    let code = store.update("cm-q1", &mutate).await.unwrap();

    assert_eq!(code, 409);
    assert_eq!(read.hits_async().await, 3);
    assert_eq!(write.hits_async().await, 3);
}

#[tokio::test]
async fn update_of_missing_document_returns_read_code() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("{COLLECTION}/gone"));
            then.status(404);
        })
        .await;

    let store = HttpStore::new(server.base_url(), "enmasse");
    let mutate = |doc: RawDocument| apply_readiness(doc, true);
    assert_eq!(store.update("gone", &mutate).await.unwrap(), 404);
}

#[tokio::test]
async fn delete_passes_store_failure_through() {
    let server = MockServer::start_async().await;
    let ok = server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("{COLLECTION}/cm-q1"));
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("{COLLECTION}/cm-q9"));
            then.status(404).body("not found");
        })
        .await;

    let store = HttpStore::new(server.base_url(), "enmasse");
    store.delete_resource("cm-q1").await.unwrap();
    ok.assert_async().await;

    let err = store.delete_resource("cm-q9").await.unwrap_err();
    assert!(matches!(err, StoreError::Status { code: 404, .. }));
}

#[tokio::test]
async fn unreachable_store_is_transport_error() {
    let store = HttpStore::new("http://127.0.0.1:1", "enmasse");
    let err = store.get(ADDRESS_CONFIG_SELECTOR).await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));
}
