//! Layered config read from disk, as the daemon's repeated `--config` does.

use std::io::Write;

use addr_config::{load_layered_yaml, load_layered_yaml_from_strings, AgentConfig};

fn write_yaml(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn files_merge_in_argument_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = write_yaml(
        &dir,
        "base.yaml",
        "address_space: tenant-a\nstore:\n  base_url: \"https://store.local\"\n",
    );
    let prod = write_yaml(&dir, "prod.yaml", "store:\n  namespace: prod\n");

    let loaded = load_layered_yaml(&[base.as_str(), prod.as_str()]).unwrap();
    let cfg = AgentConfig::from_loaded(&loaded).unwrap();
    assert_eq!(cfg.address_space, "tenant-a");
    assert_eq!(cfg.store.base_url, "https://store.local");
    assert_eq!(cfg.store.namespace, "prod");
}

#[test]
fn file_and_string_loading_hash_identically() {
    let body = "store:\n  base_url: \"https://store.local\"\n";
    let dir = tempfile::tempdir().unwrap();
    let path = write_yaml(&dir, "one.yaml", body);

    let from_file = load_layered_yaml(&[path.as_str()]).unwrap();
    let from_str = load_layered_yaml_from_strings(&[body]).unwrap();
    assert_eq!(from_file.config_hash, from_str.config_hash);
}

#[test]
fn missing_file_names_the_path() {
    let err = load_layered_yaml(&["/nonexistent/addr-agent.yaml"]).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/addr-agent.yaml"));
}
