//! Status write-back.

use addr_schemas::{AddressDocument, AddressStatus, Phase, RawDocument, ADDRESS_CONFIG_KEY};
use serde::Serialize;

use crate::StoreError;

/// Outcome of one corrective status write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WriteBack {
    /// The store applied the update (200).
    Applied { address: String, ready: bool },
    /// Stored status already matched; nothing was written (304).
    Unchanged { address: String, ready: bool },
    /// The store answered with any other code.
    Rejected { address: String, code: u16 },
    /// Transport or mutation failure.
    Failed { address: String, message: String },
}

impl WriteBack {
    /// Whether the tracked readiness may be updated to the target value.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, WriteBack::Applied { .. } | WriteBack::Unchanged { .. })
    }

    pub fn address(&self) -> &str {
        match self {
            WriteBack::Applied { address, .. }
            | WriteBack::Unchanged { address, .. }
            | WriteBack::Rejected { address, .. }
            | WriteBack::Failed { address, .. } => address,
        }
    }
}

/// Mutator body for a readiness write-back.
///
/// Sets `status.isReady` and `status.phase` (`Active` when ready, otherwise
/// `Pending`) unless the stored `isReady` already equals `ready`, in which case
/// `Ok(None)` is returned and no write should happen. A missing `isReady`
/// never equals the target.
pub fn apply_readiness(mut doc: RawDocument, ready: bool) -> Result<Option<RawDocument>, StoreError> {
    let raw = doc.data.get(ADDRESS_CONFIG_KEY).ok_or_else(|| {
        StoreError::Mutate(format!(
            "document '{}' has no {}",
            doc.name(),
            ADDRESS_CONFIG_KEY
        ))
    })?;
    let mut def: AddressDocument = serde_json::from_str(raw).map_err(|e| {
        StoreError::Mutate(format!(
            "document '{}' has invalid {}: {e}",
            doc.name(),
            ADDRESS_CONFIG_KEY
        ))
    })?;

    if def.status.as_ref().and_then(|s| s.is_ready) == Some(ready) {
        return Ok(None);
    }

    let status = def.status.get_or_insert_with(AddressStatus::default);
    status.is_ready = Some(ready);
    status.phase = Some(if ready { Phase::Active } else { Phase::Pending });

    let encoded = serde_json::to_string(&def).map_err(|e| StoreError::Mutate(e.to_string()))?;
    doc.data.insert(ADDRESS_CONFIG_KEY.to_string(), encoded);
    Ok(Some(doc))
}
