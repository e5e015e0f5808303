//! Store configuration
//!
//! Loaded from a JSON file or built in code. Every field but `path` has a
//! default, and the defaults reproduce the plain contract: padded columns,
//! unbounded lock waits, no stale-marker recovery.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};
use crate::lock::LockConfig;
use crate::schema::Schema;

/// Store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Table file path
    pub path: PathBuf,

    /// Schema for a table that does not exist yet. For an existing table,
    /// the file's header must match it exactly.
    #[serde(default)]
    pub schema: Option<Schema>,

    /// Create missing parent directories when creating the table (default: true)
    #[serde(default = "default_true")]
    pub create_parent_dirs: bool,

    /// Pad columns to a common width (default: true)
    #[serde(default = "default_true")]
    pub pad_columns: bool,

    /// Write to a sibling temp file and rename over the table (default: true)
    #[serde(default = "default_true")]
    pub atomic_write: bool,

    /// Marker-lock tuning
    #[serde(default)]
    pub lock: LockConfig,
}

fn default_true() -> bool {
    true
}

impl StoreConfig {
    /// Config for `path` with every other field at its default
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: None,
            create_parent_dirs: default_true(),
            pad_columns: default_true(),
            atomic_write: default_true(),
            lock: LockConfig::default(),
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_create_parent_dirs(mut self, create: bool) -> Self {
        self.create_parent_dirs = create;
        self
    }

    pub fn with_pad_columns(mut self, pad: bool) -> Self {
        self.pad_columns = pad;
        self
    }

    pub fn with_atomic_write(mut self, atomic: bool) -> Self {
        self.atomic_write = atomic;
        self
    }

    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.lock = lock;
        self
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| StoreError::config(format!("Failed to read config: {}", e)))?;

        let config: StoreConfig = serde_json::from_str(&content)
            .map_err(|e| StoreError::config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> StoreResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StoreError::config("path must not be empty"));
        }

        if self.lock.poll_interval_ms == 0 {
            return Err(StoreError::config("lock.poll_interval_ms must be > 0"));
        }

        if self.lock.timeout_ms == Some(0) {
            return Err(StoreError::config("lock.timeout_ms must be > 0 when set"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::new("t.db");
        assert!(config.schema.is_none());
        assert!(config.create_parent_dirs);
        assert!(config.pad_columns);
        assert!(config.atomic_write);
        assert_eq!(config.lock.poll_interval_ms, 50);
        assert!(config.lock.stale_after_ms.is_none());
        assert!(config.lock.timeout_ms.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_minimal_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipedb.json");
        fs::write(&path, r#"{"path": "data/t.db"}"#).unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config, StoreConfig::new("data/t.db"));
    }

    #[test]
    fn test_load_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipedb.json");
        fs::write(
            &path,
            r#"{
                "path": "t.db",
                "schema": ["id", "name"],
                "pad_columns": false,
                "atomic_write": false,
                "lock": {"poll_interval_ms": 5, "timeout_ms": 1000}
            }"#,
        )
        .unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.schema.unwrap().primary_key(), "id");
        assert!(!config.pad_columns);
        assert!(!config.atomic_write);
        assert!(config.create_parent_dirs);
        assert_eq!(config.lock.poll_interval_ms, 5);
        assert_eq!(config.lock.timeout_ms, Some(1000));
    }

    #[test]
    fn test_invalid_schema_in_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipedb.json");
        fs::write(&path, r#"{"path": "t.db", "schema": ["id", "id"]}"#).unwrap();

        let err = StoreConfig::load(&path).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Config);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = StoreConfig::new("t.db").with_lock(LockConfig {
            poll_interval_ms: 0,
            ..LockConfig::default()
        });
        assert_eq!(
            config.validate().unwrap_err().code(),
            StoreErrorCode::Config
        );
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let err = StoreConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::Config);
    }
}
