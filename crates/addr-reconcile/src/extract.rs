//! Raw document → typed address extraction.
//!
//! A malformed document is logged and skipped; it never aborts the batch.

use addr_schemas::{
    AddressDefinition, AddressDocument, Phase, RawDocument, ADDRESS_CONFIG_KEY,
    BROKER_ID_ANNOTATION,
};
use tracing::error;

/// Parse the `config.json` payload of a raw document.
pub fn extract(doc: &RawDocument) -> Option<AddressDocument> {
    let Some(raw) = doc.data.get(ADDRESS_CONFIG_KEY) else {
        error!(
            name = doc.name(),
            "no {} found for address document: {:?}", ADDRESS_CONFIG_KEY, doc
        );
        return None;
    };
    match serde_json::from_str::<AddressDocument>(raw) {
        Ok(def) => Some(def),
        Err(e) => {
            error!(
                name = doc.name(),
                "failed to parse {} for address: {} {:?}", ADDRESS_CONFIG_KEY, e, doc
            );
            None
        }
    }
}

/// Merge spec and status of a parsed payload into one definition.
pub fn extract_definition(def: &AddressDocument) -> Option<AddressDefinition> {
    let Some(spec) = def.spec.as_ref() else {
        error!("no spec found on {:?}", def);
        return None;
    };

    let metadata = def.metadata.as_ref();
    let name = metadata
        .and_then(|m| m.name.clone())
        .or_else(|| def.address.clone())
        .unwrap_or_else(|| spec.address.clone());
    let allocated_to = metadata.and_then(|m| m.annotations.get(BROKER_ID_ANNOTATION).cloned());

    Some(AddressDefinition {
        address: spec.address.clone(),
        address_type: spec.address_type.clone(),
        plan: spec.plan.clone(),
        allocated_to,
        status: def.status.clone(),
        name,
    })
}

/// Address string of a raw document, used as the readiness key.
///
/// Quiet on failure: [`extract`] already reports malformed payloads.
pub fn extract_address_only(doc: &RawDocument) -> Option<String> {
    let raw = doc.data.get(ADDRESS_CONFIG_KEY)?;
    let def: AddressDocument = serde_json::from_str(raw).ok()?;
    def.spec.map(|s| s.address)
}

/// Ready means a status is present and its phase is past provisioning and not
/// being torn down. `isReady` is not consulted.
pub fn is_ready(def: &AddressDocument) -> bool {
    match &def.status {
        None => false,
        Some(status) => !matches!(status.phase, Some(Phase::Terminating | Phase::Pending)),
    }
}
