//! Axum router and all HTTP handlers for addr-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers so tests can use the bare router.

use std::{convert::Infallible, sync::Arc};

use addr_reconcile::resource_name;
use addr_schemas::{AddressSpec, PropagationStats};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{delete, get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::{
    api_types::{
        AddressStatsResponse, AddressTypesResponse, AddressesResponse, CreateAddressResponse,
        ErrorResponse, HealthResponse, ReadinessResponse,
    },
    state::{AppState, BusMsg},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/addresses", get(addresses_defined).post(create_address))
        .route("/v1/addresses/ready", get(addresses_ready))
        .route("/v1/addresses/:address", delete(delete_address))
        .route("/v1/address-types", get(address_types))
        .route("/v1/address-stats", post(address_stats))
        .route("/v1/readiness", get(readiness))
        .route("/v1/stream", get(stream))
        .with_state(state)
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
            address_space: st.address_space.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/addresses, GET /v1/addresses/ready
// ---------------------------------------------------------------------------

pub(crate) async fn addresses_defined(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let addresses = st.source.lock().await.addresses_defined().to_vec();
    Json(AddressesResponse {
        address_space: st.address_space.clone(),
        count: addresses.len(),
        addresses,
    })
}

pub(crate) async fn addresses_ready(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let addresses = st.source.lock().await.addresses_ready().to_vec();
    Json(AddressesResponse {
        address_space: st.address_space.clone(),
        count: addresses.len(),
        addresses,
    })
}

// ---------------------------------------------------------------------------
// POST /v1/addresses
// ---------------------------------------------------------------------------

/// Create an address. The new document shows up in the views only once the
/// watcher delivers it.
pub(crate) async fn create_address(
    State(st): State<Arc<AppState>>,
    Json(spec): Json<AddressSpec>,
) -> Response {
    if spec.address.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "address must not be empty");
    }

    let result = st.source.lock().await.create_address(&spec).await;
    match result {
        Ok(()) => (
            StatusCode::CREATED,
            Json(CreateAddressResponse {
                name: resource_name(&spec.address),
                address: spec.address,
            }),
        )
            .into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e),
    }
}

// ---------------------------------------------------------------------------
// DELETE /v1/addresses/:address
// ---------------------------------------------------------------------------

pub(crate) async fn delete_address(
    State(st): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Response {
    let source = st.source.lock().await;
    let Some(definition) = source
        .addresses_defined()
        .iter()
        .find(|d| d.address == address)
        .cloned()
    else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("address '{address}' is not defined"),
        );
    };

    match source.delete_address(&definition).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            warn!(address = %address, error = %e, "delete failed");
            error_response(StatusCode::BAD_GATEWAY, e)
        }
    }
}

// ---------------------------------------------------------------------------
// GET /v1/address-types
// ---------------------------------------------------------------------------

pub(crate) async fn address_types(State(st): State<Arc<AppState>>) -> Response {
    let result = st.source.lock().await.list_address_types().await;
    match result {
        Ok(address_types) => Json(AddressTypesResponse { address_types }).into_response(),
        Err(e) => {
            warn!(error = %e, "address type query failed");
            error_response(StatusCode::BAD_GATEWAY, e)
        }
    }
}

// ---------------------------------------------------------------------------
// POST /v1/address-stats
// ---------------------------------------------------------------------------

/// Feed router propagation stats to the status reconciler.
///
/// At most one address is corrected per request.
pub(crate) async fn address_stats(
    State(st): State<Arc<AppState>>,
    Json(stats): Json<PropagationStats>,
) -> impl IntoResponse {
    let write_back = st.source.lock().await.check_status(&stats).await;
    if let Some(wb) = &write_back {
        info!(address = wb.address(), confirmed = wb.is_confirmed(), "status check wrote back");
    }
    Json(AddressStatsResponse { write_back })
}

// ---------------------------------------------------------------------------
// GET /v1/readiness
// ---------------------------------------------------------------------------

pub(crate) async fn readiness(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let records: Vec<_> = st.source.lock().await.readiness().iter().cloned().collect();
    Json(ReadinessResponse {
        count: records.len(),
        records,
    })
}

// ---------------------------------------------------------------------------
// GET /v1/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::Address(ev) => ev.topic(),
                    BusMsg::LogLine { .. } => "log",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged
        }
    })
}
