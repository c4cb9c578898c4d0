//! Config hash stability.
//!
//! GREEN when:
//! - the same inputs always produce the same config_hash,
//! - reordering keys within YAML does not change the hash,
//! - a different value produces a different hash,
//! - layers merge in order (later overrides earlier).

use minibar_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
bar:
  name: "Bormotuha"
storage:
  database_url: "sqlite://bar_storage.db"
  max_connections: 4
"#;

const BASE_YAML_REORDERED: &str = r#"
storage:
  max_connections: 4
  database_url: "sqlite://bar_storage.db"
bar:
  name: "Bormotuha"
"#;

const OVERLAY_YAML: &str = r#"
storage:
  database_url: "sqlite::memory:"
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();

    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();

    assert_eq!(
        original.config_hash, reordered.config_hash,
        "reordering keys in YAML must not change the hash"
    );
}

#[test]
fn overlay_changes_hash_and_overrides_value() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let layered = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    assert_ne!(base.config_hash, layered.config_hash);
    assert_eq!(layered.config.storage.database_url, "sqlite::memory:");
    // untouched siblings survive the merge
    assert_eq!(layered.config.storage.max_connections, 4);
    assert_eq!(layered.config.bar.name, "Bormotuha");
}

#[test]
fn hash_is_sha256_hex() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}
