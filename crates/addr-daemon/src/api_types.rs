//! Request and response types for the addr-daemon HTTP endpoints.
//!
//! No business logic lives here.

use addr_reconcile::{ReadinessRecord, WriteBack};
use addr_schemas::{AddressDefinition, AddressType};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub address_space: String,
}

// ---------------------------------------------------------------------------
// /v1/addresses
// ---------------------------------------------------------------------------

/// Last dispatched snapshot of one view.
#[derive(Debug, Clone, Serialize)]
pub struct AddressesResponse {
    pub address_space: String,
    pub count: usize,
    pub addresses: Vec<AddressDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAddressResponse {
    pub address: String,
    /// Store key the address document was created under.
    pub name: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// /v1/address-types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AddressTypesResponse {
    pub address_types: Vec<AddressType>,
}

// ---------------------------------------------------------------------------
// /v1/address-stats, /v1/readiness
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AddressStatsResponse {
    /// `None` when tracked readiness already agrees with the stats.
    pub write_back: Option<WriteBack>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub count: usize,
    pub records: Vec<ReadinessRecord>,
}
