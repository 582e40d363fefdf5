//! End-to-end tests for the headless pipeline through the real binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const JSON_DOC: &str = r#"{
    "saludo": {
        "respuestas": [{"respuesta": "hola buenos dias"}, "que tal", "buenas tardes"],
        "sinonimos": ["hey"]
    },
    "despedida": {
        "respuestas": ["hasta luego", {"respuesta": "nos vemos"}, "adios amigo"],
        "sinonimos": ["chao"]
    }
}"#;

const YAML_DOC: &str = "
saludo:
  respuestas:
    - respuesta: hola buenos dias
    - que tal
    - buenas tardes
  sinonimos:
    - hey
despedida:
  respuestas:
    - hasta luego
    - respuesta: nos vemos
    - adios amigo
  sinonimos:
    - chao
";

const TOML_DOC: &str = r#"
[saludo]
respuestas = [{ respuesta = "hola buenos dias" }, "que tal", "buenas tardes"]
sinonimos = ["hey"]

[despedida]
respuestas = ["hasta luego", { respuesta = "nos vemos" }, "adios amigo"]
sinonimos = ["chao"]
"#;

fn cmd() -> Command {
    Command::cargo_bin("text-classifier-cli").unwrap()
}

fn train_json_report(root: &Path, source: &Path, extra: &[&str]) -> serde_json::Value {
    let mut c = cmd();
    c.arg("--json")
        .arg("--epochs")
        .arg("2")
        .arg("--artifact-root")
        .arg(root)
        .arg("--source")
        .arg(source);
    for arg in extra {
        c.arg(arg);
    }
    let output = c.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("report is valid JSON")
}

#[test]
fn text_mode_trains_converts_and_exports() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("doc.json");
    fs::write(&source, JSON_DOC).unwrap();
    let dest = tmp.path().join("deployed.bin");

    cmd()
        .arg("--text")
        .arg("--epochs")
        .arg("2")
        .arg("--artifact-root")
        .arg(tmp.path())
        .arg("--source")
        .arg(&source)
        .arg("--convert")
        .arg("--export")
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Items serialized: 8"));

    let gen = tmp.path().join("generated/json");
    assert!(gen.join("tokenizer.json").exists());
    assert!(gen.join("text_classifier.model.json").exists());
    assert!(gen.join("label_encoder.json").exists());

    let deployable = gen.join("text_classifier.bin");
    assert!(deployable.exists());
    assert_eq!(fs::read(&dest).unwrap(), fs::read(&deployable).unwrap());
    assert_eq!(&fs::read(&deployable).unwrap()[0..4], b"TCLF");
}

#[test]
fn all_three_formats_yield_the_same_counts_and_labels() {
    let tmp = TempDir::new().unwrap();
    let docs = [
        ("doc.json", JSON_DOC, "json"),
        ("doc.yaml", YAML_DOC, "yaml"),
        ("doc.toml", TOML_DOC, "toml"),
    ];

    let mut label_keys = Vec::new();
    for (name, body, kind) in docs {
        let source = tmp.path().join(name);
        fs::write(&source, body).unwrap();
        let report = train_json_report(tmp.path(), &source, &[]);

        assert_eq!(report["item_count"], 8, "{kind}");
        assert_eq!(report["kind"], kind);

        let labels_path = tmp.path().join(format!("generated/{kind}/label_encoder.json"));
        let labels: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(labels_path).unwrap()).unwrap();
        let mut keys: Vec<String> = labels.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        label_keys.push(keys);
    }

    assert_eq!(label_keys[0], label_keys[1]);
    assert_eq!(label_keys[0], label_keys[2]);
}

#[test]
fn label_map_indices_follow_lexicographic_order() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("doc.json");
    fs::write(
        &source,
        r#"{
            "B": {"respuestas": ["uno"], "sinonimos": []},
            "A": {"respuestas": ["dos"], "sinonimos": []},
            "C": {"respuestas": ["tres"], "sinonimos": []}
        }"#,
    )
    .unwrap();

    train_json_report(tmp.path(), &source, &[]);

    let labels: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("generated/json/label_encoder.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(labels["A"], 0);
    assert_eq!(labels["B"], 1);
    assert_eq!(labels["C"], 2);
}

#[test]
fn empty_document_fails_without_artifacts() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("doc.json");
    fs::write(&source, "{}").unwrap();

    cmd()
        .arg("--text")
        .arg("--artifact-root")
        .arg(tmp.path())
        .arg("--source")
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid training document"));

    assert!(!tmp.path().join("generated/json/tokenizer.json").exists());
}

#[test]
fn headless_mode_requires_a_source() {
    cmd()
        .arg("--json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--source is required"));
}

#[test]
fn unsupported_extension_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("doc.txt");
    fs::write(&source, "hola").unwrap();

    cmd()
        .arg("--text")
        .arg("--artifact-root")
        .arg(tmp.path())
        .arg("--source")
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported document extension"));
}

#[test]
fn convert_flag_writes_the_deployable_and_reports_it() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("doc.yaml");
    fs::write(&source, YAML_DOC).unwrap();

    let report = train_json_report(tmp.path(), &source, &["--convert"]);
    let deployable = report["deployable_path"].as_str().unwrap();
    assert!(Path::new(deployable).exists());
}
