//! Loading render data and configuration from files.

use std::fs;
use std::path::Path;

use stencil_core::{RenderConfig, Value};
use tracing::debug;

use crate::error::TemplateResult;

/// Parses a data file into a value: JSON for `.json` files, YAML otherwise.
pub fn load_data(path: &Path) -> TemplateResult<Value> {
    debug!("Loading data from {:?}", path);
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let json: serde_json::Value = if is_json {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(Value::from(json))
}

/// Reads a YAML render configuration. Missing keys take their defaults.
pub fn load_config(path: &Path) -> TemplateResult<RenderConfig> {
    debug!("Loading configuration from {:?}", path);
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_core::ContentType;
    use tempfile::TempDir;

    #[test]
    fn test_load_json_and_yaml() {
        let temp = TempDir::new().unwrap();
        let json = temp.path().join("data.json");
        fs::write(&json, r#"{"name": "Arthur", "items": [1, 2]}"#).unwrap();
        let yaml = temp.path().join("data.yaml");
        fs::write(&yaml, "name: Ford\nitems:\n  - 3\n").unwrap();

        let value = load_data(&json).unwrap();
        assert_eq!(value.lookup("name").unwrap().as_str(), Some("Arthur"));
        assert_eq!(value.lookup("items").unwrap().as_sequence().unwrap().len(), 2);

        let value = load_data(&yaml).unwrap();
        assert_eq!(value.lookup("name").unwrap().as_str(), Some("Ford"));
        assert_eq!(value.lookup("items").unwrap().as_sequence().unwrap().len(), 1);
    }

    #[test]
    fn test_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stencil.yaml");
        fs::write(&path, "content_type: text\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.content_type, ContentType::Text);
        assert_eq!(config.max_depth, stencil_core::DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_invalid_data() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(load_data(&path), Err(crate::TemplateError::Json(_))));
    }
}
