//! Store key derivation for address documents.

use uuid::Uuid;

/// Longest name the store accepts.
const MAX_NAME_LEN: usize = 63;
const SUFFIX_LEN: usize = 8;

/// Deterministic store key for an address string.
///
/// The address is lowercased and reduced to `[a-z0-9.-]`, then suffixed with
/// a hash of the original string so addresses that sanitize identically
/// (`"a/b"`, `"a_b"`) still map to distinct keys.
pub fn resource_name(address: &str) -> String {
    let sanitized: String = address
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '-' => c,
            _ => '-',
        })
        .collect();

    let mut base = sanitized
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_string();
    base.truncate(MAX_NAME_LEN - SUFFIX_LEN - 1);
    let base = base.trim_end_matches(|c: char| !c.is_ascii_alphanumeric());

    let digest = Uuid::new_v5(&Uuid::NAMESPACE_URL, address.as_bytes()).simple().to_string();
    let suffix = &digest[..SUFFIX_LEN];

    if base.is_empty() {
        format!("address-{suffix}")
    } else {
        format!("{base}-{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_sanitized() {
        let a = resource_name("My/Queue_1");
        assert_eq!(a, resource_name("My/Queue_1"));
        assert!(a.starts_with("my-queue-1-"));
        assert!(a
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.'));
    }

    #[test]
    fn colliding_sanitizations_get_distinct_names() {
        assert_ne!(resource_name("a/b"), resource_name("a_b"));
    }

    #[test]
    fn long_and_empty_addresses_stay_within_limits() {
        let long = "x".repeat(200);
        assert!(resource_name(&long).len() <= MAX_NAME_LEN);
        assert!(resource_name("///").starts_with("address-"));
    }
}
