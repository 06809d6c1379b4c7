//! Persisted key/value settings (the credential store).
//!
//! A flat JSON object on disk, loaded when the store is opened and rewritten
//! in full on every mutation. The store is schema-free: values are arbitrary
//! JSON. Today the front ends only use [`API_KEY`].
//!
//! Loading never fails. A missing file yields an empty store; an unreadable
//! or malformed one yields an empty store and a warning.

use crate::error::OcrError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default credential file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Key under which the OCR API key is stored.
pub const API_KEY: &str = "api_key";

/// A JSON-file-backed key/value store.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl ConfigStore {
    /// Open the store at `path`, loading whatever is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            path: path.into(),
            values: Map::new(),
        };
        store.load();
        store
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the backing file, replacing the in-memory state.
    pub fn load(&mut self) {
        self.values = match std::fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => {
                    debug!("Loaded {} settings from {}", map.len(), self.path.display());
                    map
                }
                Ok(other) => {
                    warn!(
                        "Config file {} is not a JSON object (found {}); starting empty",
                        self.path.display(),
                        json_type_name(&other)
                    );
                    Map::new()
                }
                Err(e) => {
                    warn!("Failed to parse config file {}: {}", self.path.display(), e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!("Failed to read config file {}: {}", self.path.display(), e);
                Map::new()
            }
        };
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up a value, falling back to `default`.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    /// Look up a string value. Non-string values yield `None`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Set a value and persist the whole store.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), OcrError> {
        self.values.insert(key.into(), value.into());
        self.save()
    }

    /// Remove a key and persist. A missing key is a no-op and does not
    /// touch the file.
    pub fn delete(&mut self, key: &str) -> Result<(), OcrError> {
        if self.values.shift_remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    /// Remove every key and persist.
    pub fn clear(&mut self) -> Result<(), OcrError> {
        self.values.clear();
        self.save()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Write the whole store as 4-space indented JSON.
    fn save(&self) -> Result<(), OcrError> {
        let write_err = |source| OcrError::ConfigWriteFailed {
            path: self.path.clone(),
            source,
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.values
            .serialize(&mut ser)
            .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        std::fs::write(&self.path, buf).map_err(write_err)?;
        debug!("Saved {} settings to {}", self.values.len(), self.path.display());
        Ok(())
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::open(dir.path().join("config.json"))
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.is_empty());
        assert!(!store.path().exists(), "opening must not create the file");
    }

    #[test]
    fn set_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set("k", "v").unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.get("k"), Some(&json!("v")));
        assert_eq!(reopened.get_str("k"), Some("v"));
    }

    #[test]
    fn delete_then_default() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set("k", "v").unwrap();
        store.delete("k").unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.get_or("k", Value::Null), Value::Null);
        assert_eq!(reopened.get_or("k", json!("fallback")), json!("fallback"));
    }

    #[test]
    fn delete_missing_key_does_not_write() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.delete("nope").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupted_file_is_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "{not json").unwrap();
        assert!(store_in(&dir).is_empty());
    }

    #[test]
    fn non_object_root_is_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "[1, 2, 3]").unwrap();
        assert!(store_in(&dir).is_empty());
    }

    #[test]
    fn values_are_schema_free() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set("n", 3).unwrap();
        store.set("nested", json!({"a": [1, true, null]})).unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.get("n"), Some(&json!(3)));
        assert_eq!(reopened.get("nested"), Some(&json!({"a": [1, true, null]})));
        assert_eq!(reopened.get_str("n"), None);
    }

    #[test]
    fn clear_empties_file() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set(API_KEY, "sk-1").unwrap();
        store.clear().unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "{}");
        assert!(store_in(&dir).is_empty());
    }

    #[test]
    fn written_with_four_space_indent_and_raw_unicode() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set(API_KEY, "密钥").unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "{\n    \"api_key\": \"密钥\"\n}");
    }

    #[test]
    fn hand_edited_key_order_survives_saves() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"zeta": 1, "api_key": "old", "alpha": 2, "mid": 3}"#,
        )
        .unwrap();

        let mut store = store_in(&dir);
        store.set(API_KEY, "new").unwrap();
        store.delete("alpha").unwrap();
        store.set("beta", 4).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            text,
            "{\n    \"zeta\": 1,\n    \"api_key\": \"new\",\n    \"mid\": 3,\n    \"beta\": 4\n}"
        );
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("missing/config.json"));
        let err = store.set("k", "v").unwrap_err();
        assert!(matches!(err, OcrError::ConfigWriteFailed { .. }));
        // In-memory state still reflects the mutation.
        assert_eq!(store.get_str("k"), Some("v"));
    }

    #[test]
    fn load_picks_up_external_changes() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        std::fs::write(store.path(), r#"{"api_key": "sk-2"}"#).unwrap();
        store.load();
        assert_eq!(store.get_str(API_KEY), Some("sk-2"));
    }
}
