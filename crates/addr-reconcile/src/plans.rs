//! Plan catalog grouping.

use addr_schemas::{AddressPlan, AddressPlanDocument, AddressType, RawDocument, PLAN_DEFINITION_KEY};

use crate::CatalogError;

/// Parse the `definition` payload of a plan document.
pub fn parse_plan(doc: &RawDocument) -> Result<AddressPlanDocument, CatalogError> {
    let raw = doc
        .data
        .get(PLAN_DEFINITION_KEY)
        .ok_or_else(|| CatalogError::Parse {
            name: doc.name().to_string(),
            message: format!("missing {PLAN_DEFINITION_KEY}"),
        })?;
    serde_json::from_str(raw).map_err(|e| CatalogError::Parse {
        name: doc.name().to_string(),
        message: e.to_string(),
    })
}

/// Group plans by address type.
///
/// Plans are stable-sorted by `displayOrder` first. A missing or zero order
/// counts as unordered and sorts after every ordered plan, in discovery order.
/// Groups appear in the order their first plan appears after that sort.
pub fn group_plans(mut plans: Vec<AddressPlanDocument>) -> Vec<AddressType> {
    plans.sort_by(|a, b| sort_order(a).total_cmp(&sort_order(b)));

    let mut types: Vec<AddressType> = Vec::new();
    for plan in plans {
        let details = plan_details(&plan);
        match types.iter_mut().find(|t| t.name == plan.address_type) {
            Some(group) => group.plans.push(details),
            None => types.push(AddressType {
                name: plan.address_type,
                plans: vec![details],
            }),
        }
    }
    types
}

fn sort_order(plan: &AddressPlanDocument) -> f64 {
    plan.display_order
        .filter(|order| *order != 0.0)
        .unwrap_or(f64::MAX)
}

fn plan_details(plan: &AddressPlanDocument) -> AddressPlan {
    AddressPlan {
        name: plan.metadata.name.clone(),
        display_name: plan
            .display_name
            .clone()
            .unwrap_or_else(|| plan.metadata.name.clone()),
        short_description: plan.short_description.clone(),
        long_description: plan.long_description.clone(),
    }
}
