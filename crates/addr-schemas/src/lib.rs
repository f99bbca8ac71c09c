//! addr-schemas
//!
//! Wire-level shapes shared by the reconcile core, the store client and the
//! daemon. Serde only; no IO and no behaviour beyond small accessors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Data key holding the JSON-encoded [`AddressDocument`].
pub const ADDRESS_CONFIG_KEY: &str = "config.json";
/// Data key holding the JSON-encoded [`AddressPlanDocument`].
pub const PLAN_DEFINITION_KEY: &str = "definition";
/// Payload annotation carrying the broker an address is allocated to.
pub const BROKER_ID_ANNOTATION: &str = "enmasse.io/broker-id";
/// Label selector for address documents.
pub const ADDRESS_CONFIG_SELECTOR: &str = "type=address-config";
/// Label selector for plan documents.
pub const ADDRESS_PLAN_SELECTOR: &str = "type=address-plan";

// ---------------------------------------------------------------------------
// Raw store documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    /// Optimistic-concurrency token assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

/// Opaque versioned container owned by the external store.
///
/// Address documents carry their payload under [`ADDRESS_CONFIG_KEY`]; plan
/// documents under [`PLAN_DEFINITION_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub metadata: DocumentMeta,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: DocumentMeta {
                name: name.into(),
                ..DocumentMeta::default()
            },
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }
}

/// List envelope returned by the store's collection endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub items: Vec<RawDocument>,
}

// ---------------------------------------------------------------------------
// Address payload (`config.json`)
// ---------------------------------------------------------------------------

/// Lifecycle phase of an address as recorded in its status.
///
/// Phases this crate does not model are kept verbatim in [`Phase::Other`] so
/// a change between two of them is still a status change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Phase {
    Pending,
    Configuring,
    Active,
    Failed,
    Terminating,
    Other(String),
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Pending => "Pending",
            Phase::Configuring => "Configuring",
            Phase::Active => "Active",
            Phase::Failed => "Failed",
            Phase::Terminating => "Terminating",
            Phase::Other(raw) => raw,
        }
    }
}

impl From<String> for Phase {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Pending" => Phase::Pending,
            "Configuring" => Phase::Configuring,
            "Active" => Phase::Active,
            "Failed" => Phase::Failed,
            "Terminating" => Phase::Terminating,
            _ => Phase::Other(raw),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Phase {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Phase {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Phase::from)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressStatus {
    /// `None` when the stored status carries no `isReady` at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Fields this crate does not model; kept so write-back round-trips them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AddressStatus {
    pub fn new(is_ready: bool, phase: Phase) -> Self {
        Self {
            is_ready: Some(is_ready),
            phase: Some(phase),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSpec {
    pub address: String,
    #[serde(rename = "type", default)]
    pub address_type: String,
    #[serde(default)]
    pub plan: String,
}

impl AddressSpec {
    pub fn new(
        address: impl Into<String>,
        address_type: impl Into<String>,
        plan: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            address_type: address_type.into(),
            plan: plan.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_space: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Typed form of the `config.json` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AddressMeta>,
    /// Bare-address form used by lower-level intake that carries no metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<AddressSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AddressStatus>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One observed address: spec and status merged, plus identity and allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressDefinition {
    pub address: String,
    #[serde(rename = "type")]
    pub address_type: String,
    pub plan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AddressStatus>,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanMeta {
    pub name: String,
}

/// Typed form of a plan document's `definition` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPlanDocument {
    pub metadata: PlanMeta,
    pub address_type: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    /// Any JSON number; fractional and negative orders are valid.
    #[serde(default)]
    pub display_order: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPlan {
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
}

/// Plans available for one address type, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressType {
    pub name: String,
    pub plans: Vec<AddressPlan>,
}

// ---------------------------------------------------------------------------
// Propagation stats
// ---------------------------------------------------------------------------

/// Router propagation observed for one address.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagationStat {
    /// Percentage (0..=100) of routers that have applied the address.
    pub propagated: f64,
}

impl PropagationStat {
    pub fn new(propagated: f64) -> Self {
        Self { propagated }
    }

    pub fn is_fully_propagated(&self) -> bool {
        self.propagated >= 100.0
    }
}

/// Stats keyed by address string.
pub type PropagationStats = BTreeMap<String, PropagationStat>;
