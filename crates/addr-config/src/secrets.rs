//! Store credential resolution.
//!
//! Config carries only the NAME of the env var holding the bearer token.
//! Resolve it once at startup and hand the result to the store client.
//! Errors mention the variable name, never its value.

use anyhow::{bail, Result};

use crate::AgentConfig;

/// Bearer token for the document store. **Redacted in `Debug` output.**
#[derive(Clone, PartialEq, Eq)]
pub struct StoreToken(String);

impl StoreToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for StoreToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreToken(<REDACTED>)")
    }
}

/// Resolve the store token named by `store.token_env`.
///
/// Returns `Ok(None)` when no variable is configured (anonymous access).
/// A configured but unset or blank variable is an error.
pub fn resolve_store_token(cfg: &AgentConfig) -> Result<Option<StoreToken>> {
    let Some(var) = cfg.store.token_env.as_deref().map(str::trim) else {
        return Ok(None);
    };
    if var.is_empty() {
        return Ok(None);
    }
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(Some(StoreToken(v.trim().to_string()))),
        _ => bail!(
            "SECRETS_MISSING: required env var '{}' (store token) is not set or empty",
            var
        ),
    }
}
