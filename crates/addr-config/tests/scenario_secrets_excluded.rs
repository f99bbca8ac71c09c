//! Inline credentials are refused; tokens are resolved from the named env var.

use addr_config::{load_layered_yaml_from_strings, resolve_store_token, AgentConfig};

#[test]
fn inline_bearer_token_is_rejected() {
    let yaml = r#"
store:
  base_url: "https://store.local"
  token: "eyJhbGciOiJSUzI1NiIsImtpZCI6IiJ9.payload"
"#;
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_SECRET_DETECTED"), "got: {msg}");
    assert!(msg.contains("/store/token"));
    assert!(!msg.contains("eyJhbGci"), "secret value must never be echoed");
}

#[test]
fn token_resolved_from_named_env_var() {
    std::env::set_var("ADDR_TEST_TOKEN_PRESENT", "abc123");
    let yaml = r#"
store:
  base_url: "https://store.local"
  token_env: "ADDR_TEST_TOKEN_PRESENT"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let cfg = AgentConfig::from_loaded(&loaded).unwrap();
    let token = resolve_store_token(&cfg).unwrap().unwrap();
    assert_eq!(token.expose(), "abc123");
}

#[test]
fn missing_env_var_names_the_variable() {
    std::env::remove_var("ADDR_TEST_TOKEN_ABSENT");
    let yaml = r#"
store:
  base_url: "https://store.local"
  token_env: "ADDR_TEST_TOKEN_ABSENT"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let cfg = AgentConfig::from_loaded(&loaded).unwrap();
    let err = resolve_store_token(&cfg).unwrap_err();
    assert!(err.to_string().contains("ADDR_TEST_TOKEN_ABSENT"));
}

#[test]
fn no_token_env_means_anonymous() {
    let loaded =
        load_layered_yaml_from_strings(&["store:\n  base_url: \"http://127.0.0.1:8001\"\n"]).unwrap();
    let cfg = AgentConfig::from_loaded(&loaded).unwrap();
    assert!(resolve_store_token(&cfg).unwrap().is_none());
}
