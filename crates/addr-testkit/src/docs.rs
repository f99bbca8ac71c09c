use addr_schemas::{
    AddressStatus, PropagationStat, PropagationStats, RawDocument, ADDRESS_CONFIG_KEY,
    BROKER_ID_ANNOTATION, PLAN_DEFINITION_KEY,
};
use serde_json::json;

/// Address document `name` for `address` (type `queue`, plan `standard`).
pub fn address_doc(name: &str, address: &str, status: Option<AddressStatus>) -> RawDocument {
    payload_doc(name, address, status, None)
}

/// Like [`address_doc`], with the broker allocation annotation set.
pub fn address_doc_allocated(
    name: &str,
    address: &str,
    status: Option<AddressStatus>,
    broker: &str,
) -> RawDocument {
    payload_doc(name, address, status, Some(broker))
}

fn payload_doc(
    name: &str,
    address: &str,
    status: Option<AddressStatus>,
    broker: Option<&str>,
) -> RawDocument {
    let mut metadata = json!({ "name": name });
    if let Some(broker) = broker {
        metadata["annotations"] = json!({ BROKER_ID_ANNOTATION: broker });
    }
    let mut payload = json!({
        "apiVersion": "enmasse.io/v1",
        "kind": "Address",
        "metadata": metadata,
        "spec": { "address": address, "type": "queue", "plan": "standard" },
    });
    if let Some(status) = status {
        payload["status"] = json!(status);
    }
    RawDocument::new(name)
        .with_label("type", "address-config")
        .with_data(ADDRESS_CONFIG_KEY, payload.to_string())
}

/// Plan document for `address_type`, optionally ordered.
pub fn plan_doc(name: &str, address_type: &str, display_order: Option<f64>) -> RawDocument {
    let mut definition = json!({
        "metadata": { "name": name },
        "addressType": address_type,
        "displayName": name.to_uppercase(),
    });
    if let Some(order) = display_order {
        definition["displayOrder"] = json!(order);
    }
    RawDocument::new(name)
        .with_label("type", "address-plan")
        .with_data(PLAN_DEFINITION_KEY, definition.to_string())
}

/// Propagation stats from `(address, percent)` pairs.
pub fn stats(entries: &[(&str, f64)]) -> PropagationStats {
    entries
        .iter()
        .map(|(address, propagated)| (address.to_string(), PropagationStat::new(*propagated)))
        .collect()
}
