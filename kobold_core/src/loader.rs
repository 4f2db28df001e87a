//! Reading expected and actual documents from JSON or YAML files.

use crate::expected::Expected;
use kobold_common::{KoboldError, Value};
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

#[cfg(feature = "yaml")]
use serde_yml::Value as YamlValue;

/// Document syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Pick the format from the file extension (`json`, `yaml` or `yml`,
    /// any case).
    pub fn from_path(path: &Path) -> Result<Format, KoboldError> {
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(KoboldError::Config(format!(
                "cannot tell the document format of {}; use a .json, .yaml or .yml file",
                path.display()
            ))),
        }
    }
}

/// Parse a document into a [`Value`].
pub fn parse_document(content: &str, format: Format) -> Result<Value, KoboldError> {
    let json = match format {
        Format::Json => serde_json::from_str::<JsonValue>(content)
            .map_err(|e| KoboldError::Serialization(format!("Failed to parse JSON: {}", e)))?,
        Format::Yaml => parse_yaml(content)?,
    };
    Ok(Value::from(json))
}

/// Load a document, picking the format from the extension.
pub fn load_value(path: &Path) -> Result<Value, KoboldError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        KoboldError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", path.display(), e),
        ))
    })?;
    let format = Format::from_path(path)?;
    debug!("Loading {:?} as {:?}", path, format);
    parse_document(&content, format)
}

/// Load a document as the expected side of a comparison. Nested `__compare`
/// entries are kept and act as per-mapping overrides.
pub fn load_expected(path: &Path) -> Result<Expected, KoboldError> {
    load_value(path).map(Expected::from)
}

#[cfg(feature = "yaml")]
fn parse_yaml(content: &str) -> Result<JsonValue, KoboldError> {
    let yaml: YamlValue = serde_yml::from_str(content)
        .map_err(|e| KoboldError::Serialization(format!("Failed to parse YAML: {}", e)))?;
    yaml_to_json(yaml)
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(_content: &str) -> Result<JsonValue, KoboldError> {
    Err(KoboldError::Config(
        "YAML support is disabled; rebuild with the yaml feature".to_string(),
    ))
}

/// Convert a YAML tree into JSON. Tags are dropped; mapping keys must be
/// scalars, and numbers must have a JSON form.
#[cfg(feature = "yaml")]
fn yaml_to_json(yaml: YamlValue) -> Result<JsonValue, KoboldError> {
    Ok(match yaml {
        YamlValue::Null => JsonValue::Null,
        YamlValue::Bool(b) => JsonValue::Bool(b),
        YamlValue::Number(n) => n
            .as_i64()
            .map(JsonValue::from)
            .or_else(|| n.as_u64().map(JsonValue::from))
            .or_else(|| n.as_f64().and_then(serde_json::Number::from_f64).map(JsonValue::Number))
            .ok_or_else(|| {
                KoboldError::Serialization(format!("YAML number {} has no JSON equivalent", n))
            })?,
        YamlValue::String(s) => JsonValue::String(s),
        YamlValue::Sequence(items) => JsonValue::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        YamlValue::Mapping(entries) => {
            let mut obj = serde_json::Map::new();
            for (key, value) in entries {
                obj.insert(yaml_key(key)?, yaml_to_json(value)?);
            }
            JsonValue::Object(obj)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

#[cfg(feature = "yaml")]
fn yaml_key(key: YamlValue) -> Result<String, KoboldError> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => yaml_key(tagged.value),
        _ => Err(KoboldError::Serialization(
            "YAML mapping keys must be scalars".to_string(),
        )),
    }
}
