//! Snapshot change detection.
//!
//! Both snapshots are expected to be sorted by the display key. A change is
//! reported when the lengths differ or any positional pair fails the supplied
//! equivalence, so reordering counts as a change even when every entry has an
//! equivalent partner somewhere in the other snapshot.

use std::cmp::Ordering;

use addr_schemas::{AddressDefinition, AddressStatus};

/// Entries listed by name in a description before the rest are counted.
const DESCRIPTION_MAX: usize = 5;

/// What changed between two snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Human-readable description of the current snapshot.
    pub description: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

/// Compare `previous` with `current`.
///
/// Returns `None` when nothing changed. An empty `previous` stands in for a
/// view that has never been dispatched.
pub fn changed<T, E, K>(
    previous: &[T],
    current: &[T],
    equivalent: E,
    key: K,
) -> Option<ChangeSummary>
where
    E: Fn(&T, &T) -> bool,
    K: Fn(&T) -> &str,
{
    let differs = previous.len() != current.len()
        || previous
            .iter()
            .zip(current)
            .any(|(a, b)| !equivalent(a, b));
    if !differs {
        return None;
    }

    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut modified = Vec::new();

    let (mut i, mut j) = (0, 0);
    while i < previous.len() && j < current.len() {
        let (a, b) = (&previous[i], &current[j]);
        match key(a).cmp(key(b)) {
            Ordering::Less => {
                removed.push(key(a).to_string());
                i += 1;
            }
            Ordering::Greater => {
                added.push(key(b).to_string());
                j += 1;
            }
            Ordering::Equal => {
                if !equivalent(a, b) {
                    modified.push(key(b).to_string());
                }
                i += 1;
                j += 1;
            }
        }
    }
    removed.extend(previous[i..].iter().map(|a| key(a).to_string()));
    added.extend(current[j..].iter().map(|b| key(b).to_string()));

    Some(ChangeSummary {
        description: describe(current, key),
        added,
        removed,
        modified,
    })
}

/// `"a, b, c, d, e and 3 more"` for long lists, the JSON key list otherwise.
pub fn describe<T, K>(list: &[T], key: K) -> String
where
    K: Fn(&T) -> &str,
{
    let keys: Vec<&str> = list.iter().map(key).collect();
    if keys.len() > DESCRIPTION_MAX {
        format!(
            "{} and {} more",
            keys[..DESCRIPTION_MAX].join(", "),
            keys.len() - DESCRIPTION_MAX
        )
    } else {
        serde_json::to_string(&keys).unwrap_or_default()
    }
}

/// Display key for address snapshots.
pub fn by_address(def: &AddressDefinition) -> &str {
    &def.address
}

/// Status-blind equivalence, used for the ready view.
pub fn same_address_definition(a: &AddressDefinition, b: &AddressDefinition) -> bool {
    a.address == b.address && a.address_type == b.address_type && a.allocated_to == b.allocated_to
}

fn same_address_status(a: Option<&AddressStatus>, b: Option<&AddressStatus>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.is_ready == b.is_ready && a.phase == b.phase && a.message == b.message,
        _ => false,
    }
}

/// Status-aware equivalence, used for the defined view.
pub fn same_address_definition_and_status(a: &AddressDefinition, b: &AddressDefinition) -> bool {
    same_address_definition(a, b) && same_address_status(a.status.as_ref(), b.status.as_ref())
}
