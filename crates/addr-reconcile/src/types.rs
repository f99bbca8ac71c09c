use addr_schemas::AddressDefinition;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Notification published whenever a derived view changes.
///
/// The payload is always the complete current snapshot, never a delta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "addresses", rename_all = "snake_case")]
pub enum AddressEvent {
    AddressesDefined(Vec<AddressDefinition>),
    AddressesReady(Vec<AddressDefinition>),
}

impl AddressEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            AddressEvent::AddressesDefined(_) => "addresses_defined",
            AddressEvent::AddressesReady(_) => "addresses_ready",
        }
    }

    pub fn addresses(&self) -> &[AddressDefinition] {
        match self {
            AddressEvent::AddressesDefined(a) | AddressEvent::AddressesReady(a) => a,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors a [`crate::DocumentStore`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network or transport failure.
    Transport(String),
    /// The store answered with a non-success status.
    Status { code: u16, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// The update mutator could not process the current document.
    Mutate(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Transport(msg) => write!(f, "store transport error: {msg}"),
            StoreError::Status { code, message } => {
                write!(f, "store returned status {code}: {message}")
            }
            StoreError::Decode(msg) => write!(f, "store decode error: {msg}"),
            StoreError::Mutate(msg) => write!(f, "document mutation failed: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Failure of a create/delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// The store refused the new document.
    Rejected {
        definition: String,
        code: u16,
        reason: String,
    },
    /// The document could not be encoded.
    Encode(String),
    /// The store call itself failed.
    Store(StoreError),
}

impl std::fmt::Display for MutationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationError::Rejected {
                definition,
                code,
                reason,
            } => write!(f, "failed to create address {definition}: {code} {reason}"),
            MutationError::Encode(msg) => write!(f, "failed to encode address: {msg}"),
            MutationError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MutationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MutationError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for MutationError {
    fn from(e: StoreError) -> Self {
        MutationError::Store(e)
    }
}

/// Failure of the plan catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Store(StoreError),
    /// A plan document carried no parseable definition.
    Parse { name: String, message: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Store(e) => write!(f, "{e}"),
            CatalogError::Parse { name, message } => {
                write!(f, "invalid plan definition in '{name}': {message}")
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Store(e) => Some(e),
            CatalogError::Parse { .. } => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        CatalogError::Store(e)
    }
}

/// Canonical reason phrase for an HTTP-style status code.
pub fn status_text(code: u16) -> &'static str {
    http::StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status")
}
