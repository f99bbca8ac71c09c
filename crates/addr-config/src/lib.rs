//! addr-config
//!
//! Layered YAML configuration for the address agent.
//!
//! - Layers merge in order: earlier documents are the base, later ones override.
//! - Secret-looking literal values are refused; config stores env var NAMES.
//! - The merged document is canonicalized (sorted keys) and hashed with SHA-256
//!   so a running agent can log exactly which configuration it booted with.
//! - [`AgentConfig`] is the typed view every other crate consumes.

mod secrets;

pub use secrets::{resolve_store_token, StoreToken};

use std::collections::BTreeSet;
use std::fs;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Prefixes that mark a leaf value as an inline credential.
const SECRET_PREFIXES: &[&str] = &[
    "eyJ",        // JWT / service-account bearer token
    "sha256~",    // OpenShift OAuth access token
    "sk-",        // generic API secret
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
];

/// Top-level sections the agent reads. Anything else is reported as unused.
const CONSUMED_POINTERS: &[&str] = &["/address_space", "/store", "/watch", "/daemon"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let layer: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let layer = serde_json::to_value(layer).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, layer);
    }

    enforce_no_secret_literals(&merged)?;

    // serde_json::Map is ordered by key, so this serialization is canonical.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (k, v) in overlay {
                let prev = base.remove(&k).unwrap_or(Value::Null);
                base.insert(k, deep_merge(prev, v));
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(v, "", &mut leaves);
    for ptr in leaves {
        if let Some(s) = v.pointer(&ptr).and_then(Value::as_str) {
            if looks_like_secret(s) {
                bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
            }
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}

fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, child) in map {
                let token = k.replace('~', "~0").replace('/', "~1");
                collect_leaf_pointers(child, &format!("{prefix}/{token}"), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_leaf_pointers(child, &format!("{prefix}/{i}"), out);
            }
        }
        _ => out.push(if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }),
    }
}

/// `"/a/b"` covers `"/a/b"` and `"/a/b/c"` but not `"/a/bc"`.
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    leaf == prefix
        || leaf
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

// ---------------------------------------------------------------------------
// Unused keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Leaf pointers not read by the agent (sorted, unique).
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Report config leaves outside the sections the agent reads.
///
/// With [`UnusedKeyPolicy::Fail`] a non-clean report is an error; with
/// [`UnusedKeyPolicy::Warn`] the report is always returned for the caller to log.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut leaves = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let unused: BTreeSet<String> = leaves
        .into_iter()
        .filter(|leaf| leaf != "/")
        .filter(|leaf| !CONSUMED_POINTERS.iter().any(|p| is_prefix_pointer(p, leaf)))
        .collect();
    let report = UnusedKeyReport {
        unused_leaf_pointers: unused.into_iter().collect(),
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS: {} unused config leaf key(s) detected: {:?}",
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers
        );
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_address_space")]
    pub address_space: String,
    pub store: StoreConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// REST endpoint of the document store, e.g. `https://kubernetes.default.svc`.
    pub base_url: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// NAME of the env var holding the bearer token, never the token itself.
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// How often a conflicting conditional update is re-read and re-applied.
    #[serde(default = "default_update_conflict_retries")]
    pub update_conflict_retries: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_address_space() -> String {
    "default".to_string()
}
fn default_namespace() -> String {
    "default".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_update_conflict_retries() -> u32 {
    3
}
fn default_poll_interval_ms() -> u64 {
    2_000
}
fn default_bind_addr() -> String {
    "127.0.0.1:8890".to_string()
}

impl AgentConfig {
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let cfg: AgentConfig = serde_json::from_value(loaded.config_json.clone())
            .context("CONFIG_INVALID: agent config does not match schema")?;
        if cfg.store.base_url.trim().is_empty() {
            bail!("CONFIG_INVALID: store.base_url must not be empty");
        }
        if cfg.watch.poll_interval_ms == 0 {
            bail!("CONFIG_INVALID: watch.poll_interval_ms must be positive");
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_pointer_respects_boundaries() {
        assert!(is_prefix_pointer("/store", "/store"));
        assert!(is_prefix_pointer("/store", "/store/base_url"));
        assert!(!is_prefix_pointer("/store", "/storex"));
    }

    #[test]
    fn deep_merge_overrides_leaves_only() {
        let merged = deep_merge(
            serde_json::json!({"store": {"base_url": "a", "namespace": "n"}}),
            serde_json::json!({"store": {"base_url": "b"}}),
        );
        assert_eq!(merged["store"]["base_url"], "b");
        assert_eq!(merged["store"]["namespace"], "n");
    }

    #[test]
    fn secret_detection_needs_length_and_prefix() {
        assert!(looks_like_secret("eyJhbGciOiJSUzI1NiJ9"));
        assert!(!looks_like_secret("sk-1"));
        assert!(!looks_like_secret("STORE_TOKEN"));
    }
}
