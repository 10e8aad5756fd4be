use std::fs;
use std::path::PathBuf;

use paramspec_core::{
    ConfigError, Configuration, DocumentKind, ParameterKind, SchemaRegistry, ValueOptions, expand,
    flatten, load_document,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tempfile::TempDir;

const SPEC_YAML: &str = r#"
- name: epochs
  help: Number of training epochs
  required: true
  parameter_type: int
  default: 10
  p1: 1
  p2: 100
- name: lr
  help: Learning rate
  required: true
  parameter_type: float
  default: 0.01
  p1: 0.0001
  p2: 0.1
- name: note
  help: Free-form note
  required: false
  parameter_type: str
  default: null
- model:
    - name: activation
      help: Activation function
      required: true
      parameter_type: categorical
      default: relu
      options: [relu, gelu, tanh]
    - name: widths
      help: Hidden layer widths
      required: true
      parameter_type: list
      default: [64, 64]
      value_type: int
    - name: dropout
      help: Use dropout
      required: true
      parameter_type: bool
      default: false
      is_constant: false
"#;

const CONFIG_JSON: &str = r#"{
    "epochs": 20,
    "model": {
        "activation": "gelu",
        "widths": ["128", "32"]
    }
}"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path
}

fn loaded(dir: &TempDir) -> Configuration {
    let spec = write(dir, "spec.yaml", SPEC_YAML);
    let config = write(dir, "config.json", CONFIG_JSON);
    let mut store = Configuration::new();
    store.load_spec_file(&spec).unwrap();
    store.load_config_file(&config).unwrap();
    store
}

#[test]
fn yaml_spec_and_json_config_resolve_effective_values() {
    let dir = TempDir::new().unwrap();
    let store = loaded(&dir);

    let values = store
        .get_values(ValueOptions::default().with_expand(true))
        .unwrap();
    assert_eq!(
        values,
        json!({
            "epochs": 20,
            "lr": 0.01,
            "model": {"activation": "gelu", "widths": [128, 32], "dropout": false}
        })
    );
}

#[test]
fn registry_preserves_declaration_order_and_kinds() {
    let dir = TempDir::new().unwrap();
    let store = loaded(&dir);
    let kinds: Vec<(&str, ParameterKind)> = store
        .schema()
        .iter()
        .map(|(key, parameter)| (key, parameter.kind()))
        .collect();
    assert_eq!(
        kinds,
        [
            ("epochs", ParameterKind::Int),
            ("lr", ParameterKind::Float),
            ("note", ParameterKind::Str),
            ("model.activation", ParameterKind::Categorical),
            ("model.widths", ParameterKind::List),
            ("model.dropout", ParameterKind::Bool),
        ]
    );
}

#[test]
fn seeded_random_values_respect_bounds_and_options() {
    let dir = TempDir::new().unwrap();
    let store = loaded(&dir);
    let options = ValueOptions::default().with_random(true);

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let values = store.get_values_with_rng(options, &mut rng).unwrap();
        let epochs = values["epochs"].as_i64().unwrap();
        assert!((1..=100).contains(&epochs));
        let lr = values["lr"].as_f64().unwrap();
        assert!((0.0001..0.1).contains(&lr));
        let activation = values["model.activation"].as_str().unwrap();
        assert!(["relu", "gelu", "tanh"].contains(&activation));
        assert_eq!(values["model.widths"], json!([64, 64]));
        assert!(values.get("note").is_none());
    }

    let mut first = StdRng::seed_from_u64(3);
    let mut second = StdRng::seed_from_u64(3);
    assert_eq!(
        store.get_values_with_rng(options, &mut first).unwrap(),
        store.get_values_with_rng(options, &mut second).unwrap()
    );
}

#[test]
fn saved_files_reload_to_the_same_store() {
    let dir = TempDir::new().unwrap();
    let store = loaded(&dir);
    let spec_out = dir.path().join("spec_out.json");
    let config_out = dir.path().join("config_out.json");
    store.save_spec_file(&spec_out).unwrap();
    store.save_config_file(&config_out).unwrap();

    let saved_spec = load_document(&spec_out).unwrap();
    assert!(saved_spec.is_array());
    let reloaded_registry = SchemaRegistry::from_document(&saved_spec).unwrap();
    assert_eq!(&reloaded_registry, store.schema());

    let mut reloaded = Configuration::new();
    reloaded.load_spec_file(&spec_out).unwrap();
    reloaded.load_config_file(&config_out).unwrap();
    assert_eq!(
        reloaded.get_values(ValueOptions::default()).unwrap(),
        store.get_values(ValueOptions::default()).unwrap()
    );
}

#[test]
fn inferred_spec_can_be_saved_and_reused() {
    let dir = TempDir::new().unwrap();
    let config = write(
        &dir,
        "values.yml",
        "batch: 32\nname: run-1\naugment:\n  - {op: flip, p: 0.5}\nopt:\n  betas: [0.9, 0.99]\n",
    );
    let mut inferred = Configuration::new();
    inferred.load_config_file(&config).unwrap();
    assert!(!inferred.has_spec());
    assert_eq!(
        inferred.schema().get("augment").unwrap().to_dict()["value_type"],
        json!("dict")
    );

    let spec_path = dir.path().join("_spec_auto.json");
    inferred.save_spec_file(&spec_path).unwrap();

    let mut reused = Configuration::new();
    reused.load_spec_file(&spec_path).unwrap();
    reused.load_config_file(&config).unwrap();
    assert!(reused.has_spec());
    assert_eq!(
        reused
            .get_values(ValueOptions::default().with_expand(true))
            .unwrap(),
        load_document(&config).unwrap()
    );
}

#[test]
fn config_keys_outside_the_spec_are_rejected() {
    let dir = TempDir::new().unwrap();
    let spec = write(&dir, "spec.yaml", SPEC_YAML);
    let config = write(&dir, "config.json", r#"{"model": {"depth": 3}}"#);
    let mut store = Configuration::new();
    store.load_spec_file(&spec).unwrap();
    let err = store.load_config_file(&config).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownParameter(name) if name == "model.depth"));
}

#[test]
fn config_document_round_trips_through_flat_form() {
    let doc = load_document(write(
        &TempDir::new().unwrap(),
        "doc.json",
        r#"{"a": {"b": {"c": 1, "d": [1, 2]}, "e": "x"}, "f": [{"k": "v"}], "g": {}}"#,
    ))
    .unwrap();
    let flat = flatten(&doc, DocumentKind::Config).unwrap();
    assert_eq!(
        flat.keys().map(String::as_str).collect::<Vec<_>>(),
        ["a.b.c", "a.b.d", "a.e", "f", "g"]
    );
    assert_eq!(expand(&flat, DocumentKind::Config).unwrap(), doc);
}
