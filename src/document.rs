//! Training-document parsing.
//!
//! All three formats carry the same schema: a map of category keys to
//! `{ respuestas: [ {respuesta: string} | string, ... ], sinonimos: [string] }`.
//! Category keys double as class labels. Each format is decoded into a generic
//! JSON value first so one extraction routine serves all three.

use crate::model::{FormatKind, TrainingPair};
use crate::trainer::TrainerError;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read and parse a document, returning its training pairs in document order.
///
/// Answers come before synonyms within each category, matching the order the
/// categories appear in the document. An empty result is not an error here;
/// the trainer decides that no pairs means the input is unusable.
pub fn parse(path: &Path, kind: FormatKind) -> Result<Vec<TrainingPair>, TrainerError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| TrainerError::Input(format!("cannot read {}: {e}", path.display())))?;
    let value = decode(&raw, kind)
        .map_err(|e| TrainerError::Input(format!("cannot parse {}: {e}", path.display())))?;
    Ok(extract_pairs(&value))
}

fn decode(raw: &str, kind: FormatKind) -> anyhow::Result<Value> {
    let value = match kind {
        FormatKind::Json => serde_json::from_str(raw)?,
        FormatKind::Yaml => serde_json::to_value(serde_yaml::from_str::<serde_yaml::Value>(raw)?)?,
        FormatKind::Toml => serde_json::to_value(raw.parse::<toml::Table>()?)?,
    };
    Ok(value)
}

/// Walk the decoded document and collect (text, category) pairs.
///
/// Answer entries may be plain strings or maps carrying a `respuesta` key;
/// anything else is skipped rather than rejected, so one malformed entry does
/// not sink the whole document.
fn extract_pairs(doc: &Value) -> Vec<TrainingPair> {
    let mut pairs = Vec::new();
    let Some(categories) = doc.as_object() else {
        return pairs;
    };

    for (category, content) in categories {
        let answers = content.get("respuestas").and_then(Value::as_array);
        for entry in answers.into_iter().flatten() {
            let text = match entry {
                Value::String(s) => Some(s.as_str()),
                Value::Object(map) => map.get("respuesta").and_then(Value::as_str),
                _ => None,
            };
            if let Some(text) = text {
                pairs.push(TrainingPair {
                    text: text.to_string(),
                    label: category.clone(),
                });
            }
        }

        let synonyms = content.get("sinonimos").and_then(Value::as_array);
        for synonym in synonyms.into_iter().flatten() {
            if let Some(text) = synonym.as_str() {
                pairs.push(TrainingPair {
                    text: text.to_string(),
                    label: category.clone(),
                });
            }
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_DOC: &str = r#"{
        "saludo": {
            "respuestas": [{"respuesta": "hola, buenos dias"}, "que tal"],
            "sinonimos": ["buenas"]
        },
        "despedida": {
            "respuestas": [{"respuesta": "hasta luego"}],
            "sinonimos": []
        }
    }"#;

    #[test]
    fn json_mixes_keyed_and_plain_answers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.json");
        fs::write(&path, JSON_DOC).unwrap();

        let pairs = parse(&path, FormatKind::Json).unwrap();
        assert_eq!(pairs.len(), 4);
        assert!(pairs
            .iter()
            .any(|p| p.text == "buenas" && p.label == "saludo"));
        assert!(pairs
            .iter()
            .any(|p| p.text == "hasta luego" && p.label == "despedida"));
    }

    #[test]
    fn yaml_and_toml_yield_the_same_pairs_as_json() {
        let yaml = "
saludo:
  respuestas:
    - respuesta: hola, buenos dias
    - que tal
  sinonimos:
    - buenas
despedida:
  respuestas:
    - respuesta: hasta luego
  sinonimos: []
";
        let toml_doc = r#"
[saludo]
respuestas = [{ respuesta = "hola, buenos dias" }, "que tal"]
sinonimos = ["buenas"]

[despedida]
respuestas = [{ respuesta = "hasta luego" }]
sinonimos = []
"#;
        let tmp = tempfile::tempdir().unwrap();
        let json_path = tmp.path().join("doc.json");
        let yaml_path = tmp.path().join("doc.yaml");
        let toml_path = tmp.path().join("doc.toml");
        fs::write(&json_path, JSON_DOC).unwrap();
        fs::write(&yaml_path, yaml).unwrap();
        fs::write(&toml_path, toml_doc).unwrap();

        let from_json = parse(&json_path, FormatKind::Json).unwrap();
        let from_yaml = parse(&yaml_path, FormatKind::Yaml).unwrap();
        let from_toml = parse(&toml_path, FormatKind::Toml).unwrap();

        let labels = |pairs: &[TrainingPair]| {
            let mut ls: Vec<_> = pairs.iter().map(|p| p.label.clone()).collect();
            ls.sort();
            ls
        };
        assert_eq!(from_json.len(), from_yaml.len());
        assert_eq!(from_json.len(), from_toml.len());
        assert_eq!(labels(&from_json), labels(&from_yaml));
        assert_eq!(labels(&from_json), labels(&from_toml));
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.json");
        fs::write(
            &path,
            r#"{"cat": {"respuestas": [42, {"otra": "clave"}, "valida"], "sinonimos": [7]}}"#,
        )
        .unwrap();

        let pairs = parse(&path, FormatKind::Json).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].text, "valida");
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = parse(Path::new("/nonexistent/doc.json"), FormatKind::Json).unwrap_err();
        assert!(matches!(err, TrainerError::Input(_)));
    }

    #[test]
    fn unparsable_document_is_an_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.toml");
        fs::write(&path, "not [ valid toml").unwrap();
        let err = parse(&path, FormatKind::Toml).unwrap_err();
        assert!(matches!(err, TrainerError::Input(_)));
    }
}
