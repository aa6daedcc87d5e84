//! JSON database description parsing.
//!
//! Expected layout:
//!
//! ```json
//! {"datasets": {"train": {"utt1": {"audio_path": {"observation": "a.wav"}}}}}
//! ```
//!
//! Dataset and example order follow the file.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{IteratorError, IteratorResult};
use crate::keys::DATASETS;
use crate::types::{Map, Value, map_from_json};

/// Example id -> example body.
pub type Examples = IndexMap<String, Map>;

/// Dataset name -> examples.
pub type Datasets = IndexMap<String, Examples>;

#[derive(Debug, Deserialize)]
struct RawDescription {
    datasets: IndexMap<String, IndexMap<String, serde_json::Value>>,
}

/// Parse a description file.
pub fn parse_description_path(path: impl AsRef<Path>) -> IteratorResult<Datasets> {
    let text = fs::read_to_string(path)?;
    parse_description_str(&text)
}

/// Parse a description from an in-memory string.
pub fn parse_description_str(input: &str) -> IteratorResult<Datasets> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IteratorError::configuration("database description is empty"));
    }
    let raw: RawDescription = serde_json::from_str(trimmed)?;

    let mut datasets = Datasets::with_capacity(raw.datasets.len());
    for (name, examples) in raw.datasets {
        let mut converted = Examples::with_capacity(examples.len());
        for (id, body) in examples {
            let body = match body {
                serde_json::Value::Object(obj) => map_from_json(obj),
                other => {
                    return Err(IteratorError::TypeMismatch {
                        field: format!("{DATASETS}.{name}.{id}"),
                        expected: "object",
                        found: Value::from(other).type_name(),
                    });
                }
            };
            converted.insert(id, body);
        }
        datasets.insert(name, converted);
    }
    Ok(datasets)
}

#[cfg(test)]
mod tests {
    use super::parse_description_str;
    use crate::error::IteratorError;
    use crate::types::Value;

    #[test]
    fn keeps_file_order() {
        let datasets = parse_description_str(
            r#"{"datasets": {"b": {"z": {"n": 1}, "a": {"n": 2}}, "a": {}}}"#,
        )
        .unwrap();
        assert_eq!(datasets.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(datasets["b"].keys().collect::<Vec<_>>(), vec!["z", "a"]);
        assert_eq!(datasets["b"]["a"]["n"], Value::Int64(2));
    }

    #[test]
    fn rejects_malformed_descriptions() {
        assert!(matches!(
            parse_description_str("  "),
            Err(IteratorError::Configuration { .. })
        ));
        assert!(matches!(
            parse_description_str(r#"{"examples": {}}"#),
            Err(IteratorError::Json(_))
        ));
        match parse_description_str(r#"{"datasets": {"d": {"u1": [1, 2]}}}"#) {
            Err(IteratorError::TypeMismatch { field, found, .. }) => {
                assert_eq!(field, "datasets.d.u1");
                assert_eq!(found, "list");
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
    }
}
