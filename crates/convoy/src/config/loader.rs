//! Asynchronous unit config loading with per-path caching

use crate::config::plan_file::ConfigRef;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Resolves unit config references ahead of deployment.
///
/// Inline objects are returned as-is, string references are read from the
/// filesystem and parsed; parsed files are cached by path so repeated
/// references across units reuse the first successful load.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    cache: RwLock<HashMap<String, Value>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a config reference to a concrete JSON object.
    ///
    /// An absent reference resolves to an empty object.
    pub async fn load(&self, field: Option<&ConfigRef>) -> Result<Value, ConfigLoadError> {
        match field {
            None => Ok(Value::Object(Map::new())),
            Some(ConfigRef::Inline(value)) => {
                if value.is_object() {
                    Ok(value.clone())
                } else {
                    Err(ConfigLoadError::InvalidField)
                }
            }
            Some(ConfigRef::Path(path)) => self.get_or_load(path).await,
        }
    }

    async fn get_or_load(&self, path: &str) -> Result<Value, ConfigLoadError> {
        if let Some(cached) = self.cache.read().await.get(path) {
            return Ok(cached.clone());
        }

        let loaded = load_and_parse(path).await?;

        let mut cache = self.cache.write().await;
        // A concurrent load of the same path may have won the race; keep
        // the first entry so every reference observes the same value.
        let value = cache.entry(path.to_string()).or_insert(loaded);
        Ok(value.clone())
    }
}

async fn load_and_parse(path: &str) -> Result<Value, ConfigLoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigLoadError::Io {
            path: path.to_string(),
            source: e,
        })?;

    let value: Value = serde_yaml::from_str(&content).map_err(|e| ConfigLoadError::Parse {
        path: path.to_string(),
        source: e,
    })?;

    if !value.is_object() {
        return Err(ConfigLoadError::NotAnObject {
            path: path.to_string(),
        });
    }

    Ok(value)
}

/// Errors that can occur when resolving a unit config reference
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("field `config` must contain an object or a string (path to a config file)")]
    InvalidField,

    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file '{path}' does not contain an object")]
    NotAnObject { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_absent_config_resolves_to_empty_object() {
        let loader = ConfigLoader::new();
        let value = loader.load(None).await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_inline_object_returned_as_is() {
        let loader = ConfigLoader::new();
        let inline = ConfigRef::Inline(json!({"port": 8080}));
        let value = loader.load(Some(&inline)).await.unwrap();
        assert_eq!(value, json!({"port": 8080}));
    }

    #[tokio::test]
    async fn test_inline_non_object_rejected() {
        let loader = ConfigLoader::new();
        let inline = ConfigRef::Inline(json!(42));
        let result = loader.load(Some(&inline)).await;
        assert!(matches!(result, Err(ConfigLoadError::InvalidField)));
    }

    #[tokio::test]
    async fn test_path_loads_and_caches() {
        let dir = std::env::temp_dir().join("convoy-loader-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("unit.yaml");
        std::fs::write(&path, "port: 8080\n").unwrap();
        let path = path.to_string_lossy().into_owned();

        let loader = ConfigLoader::new();
        let reference = ConfigRef::Path(path.clone());
        let first = loader.load(Some(&reference)).await.unwrap();
        assert_eq!(first, json!({"port": 8080}));

        // Cached: a rewrite of the file must not be observed.
        std::fs::write(&path, "port: 9090\n").unwrap();
        let second = loader.load(Some(&reference)).await.unwrap();
        assert_eq!(second, json!({"port": 8080}));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let loader = ConfigLoader::new();
        let reference = ConfigRef::Path("does/not/exist.yaml".to_string());
        let result = loader.load(Some(&reference)).await;
        assert!(matches!(result, Err(ConfigLoadError::Io { .. })));
    }

    #[tokio::test]
    async fn test_non_object_file_rejected() {
        let dir = std::env::temp_dir().join("convoy-loader-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scalar.yaml");
        std::fs::write(&path, "42\n").unwrap();

        let loader = ConfigLoader::new();
        let reference = ConfigRef::Path(path.to_string_lossy().into_owned());
        let result = loader.load(Some(&reference)).await;
        assert!(matches!(result, Err(ConfigLoadError::NotAnObject { .. })));
    }
}
