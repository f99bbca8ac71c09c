//! Document construction for address creation.

use std::collections::BTreeMap;

use addr_schemas::{
    AddressDocument, AddressMeta, AddressSpec, RawDocument, ADDRESS_CONFIG_KEY,
};

use crate::naming::resource_name;
use crate::MutationError;

pub const ADDRESS_API_VERSION: &str = "enmasse.io/v1";
pub const ADDRESS_KIND: &str = "Address";

/// Build the store document for a new address in `address_space`.
///
/// The payload carries only the spec; status is filled in later by the
/// controller and by readiness write-back.
pub fn address_config_document(
    address_space: &str,
    spec: &AddressSpec,
) -> Result<RawDocument, MutationError> {
    let name = resource_name(&spec.address);
    let payload = AddressDocument {
        api_version: Some(ADDRESS_API_VERSION.to_string()),
        kind: Some(ADDRESS_KIND.to_string()),
        metadata: Some(AddressMeta {
            name: Some(name.clone()),
            address_space: Some(address_space.to_string()),
            annotations: BTreeMap::new(),
        }),
        spec: Some(spec.clone()),
        ..AddressDocument::default()
    };
    let encoded =
        serde_json::to_string(&payload).map_err(|e| MutationError::Encode(e.to_string()))?;

    let mut doc = RawDocument::new(name)
        .with_label("type", "address-config")
        .with_annotation("addressSpace", address_space)
        .with_data(ADDRESS_CONFIG_KEY, encoded);
    doc.api_version = Some("v1".to_string());
    doc.kind = Some("ConfigMap".to_string());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_carries_spec_and_selector_label() {
        let spec = AddressSpec::new("q2", "queue", "standard");
        let doc = address_config_document("space-a", &spec).unwrap();

        assert_eq!(doc.name(), resource_name("q2"));
        assert_eq!(doc.metadata.labels.get("type").map(String::as_str), Some("address-config"));
        assert_eq!(
            doc.metadata.annotations.get("addressSpace").map(String::as_str),
            Some("space-a")
        );

        let payload: serde_json::Value =
            serde_json::from_str(doc.data.get(ADDRESS_CONFIG_KEY).unwrap()).unwrap();
        assert_eq!(payload["kind"], "Address");
        assert_eq!(payload["metadata"]["addressSpace"], "space-a");
        assert_eq!(payload["spec"]["address"], "q2");
        assert_eq!(payload["spec"]["type"], "queue");
        assert_eq!(payload["spec"]["plan"], "standard");
        assert!(payload.get("status").is_none());
    }
}
