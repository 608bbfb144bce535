//! YAML loading helpers

use crate::error::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load a YAML document from a file
pub fn load_yaml(path: impl AsRef<Path>) -> ConfigResult<Value> {
    let path = path.as_ref();
    debug!(?path, "Loading YAML file");

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_yaml_string(&content)
}

/// Parse a YAML document from a string
pub fn load_yaml_string(content: &str) -> ConfigResult<Value> {
    Ok(serde_yaml::from_str(content)?)
}

/// Deserialize the top-level `key` section of a document
///
/// A missing section yields `T::default()`.
pub fn section<T: DeserializeOwned + Default>(yaml: &Value, key: &str) -> ConfigResult<T> {
    match yaml.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_yaml::from_value(value.clone()).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
