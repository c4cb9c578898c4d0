use minibar_config::{
    load_layered_yaml, load_layered_yaml_from_strings, BarConfig, DEFAULT_DATABASE_URL,
};

#[test]
fn empty_document_yields_defaults() {
    let loaded = load_layered_yaml_from_strings(&[""]).expect("empty config must load");
    assert_eq!(loaded.config, BarConfig::default());
    assert_eq!(loaded.config.storage.database_url, DEFAULT_DATABASE_URL);
    assert_eq!(loaded.config.storage.busy_timeout_ms, 5_000);
    assert!(loaded.config.storage.schema_dir.is_none());
}

#[test]
fn zero_max_connections_is_rejected() {
    let yaml = r#"
storage:
  max_connections: 0
"#;
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    assert!(format!("{err:#}").contains("max_connections"));
}

#[test]
fn wrong_type_is_rejected() {
    let yaml = r#"
storage:
  max_connections: "lots"
"#;
    assert!(load_layered_yaml_from_strings(&[yaml]).is_err());
}

#[test]
fn loads_layers_from_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let local = dir.path().join("local.yaml");
    std::fs::write(&base, "bar:\n  name: \"Base Bar\"\nstorage:\n  schema_dir: \"schema\"\n").unwrap();
    std::fs::write(&local, "bar:\n  name: \"Local Bar\"\n").unwrap();

    let base_s = base.to_string_lossy().to_string();
    let local_s = local.to_string_lossy().to_string();
    let loaded = load_layered_yaml(&[base_s.as_str(), local_s.as_str()]).unwrap();

    assert_eq!(loaded.config.bar.name, "Local Bar");
    assert_eq!(loaded.config.storage.schema_dir.as_deref(), Some("schema"));
}

#[test]
fn missing_file_is_an_error_naming_the_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
}
