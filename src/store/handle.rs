//! Public store handle

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};
use super::shared::Shared;
use crate::observability::MetricsSnapshot;
use crate::record::{Fields, Record};
use crate::schema::Schema;

/// Handle on one table file.
///
/// Clones share a cache and a lock. Independent handles over the same path,
/// in this process or another, each keep their own cache and coordinate
/// through the marker lock and the file's mtime.
///
/// Every call first runs the read protocol, so a handle sees whatever
/// another handle committed before the call began.
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    /// Opens the table at `path` with default settings.
    ///
    /// An existing file is loaded; if `schema` is given its header must
    /// match it exactly. A missing file is created empty with `schema`,
    /// along with any missing parent directories.
    ///
    /// # Errors
    ///
    /// - `PIPEDB_HEADERS_MISSING` if the file does not exist and `schema`
    ///   is `None`
    /// - `PIPEDB_HEADERS_MISMATCH` if the file's header differs from `schema`
    /// - `PIPEDB_CORRUPTION` / `PIPEDB_IO_ERROR` if the file cannot be loaded
    pub fn open(path: impl Into<PathBuf>, schema: Option<Schema>) -> StoreResult<Self> {
        let mut config = StoreConfig::new(path);
        config.schema = schema;
        Self::open_with(config)
    }

    /// Opens a store from a full configuration.
    pub fn open_with(config: StoreConfig) -> StoreResult<Self> {
        Ok(Self {
            shared: Shared::open(config)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.shared.path()
    }

    pub fn schema(&self) -> &Schema {
        self.shared.schema()
    }

    /// Counters for this handle and its clones
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics().snapshot()
    }

    /// Runs the read protocol. Returns whether the cache was reloaded.
    pub fn read(&self) -> StoreResult<bool> {
        let mut state = self.shared.state();
        self.shared.refresh(&mut state)
    }

    /// Runs the write protocol, overwriting the file with the cache.
    pub fn write(&self) -> StoreResult<()> {
        let mut state = self.shared.state();
        self.shared.persist(&mut state)
    }

    pub fn len(&self) -> StoreResult<usize> {
        self.shared.view(|cache| Ok(cache.len()))
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn contains(&self, key: impl Into<Value>) -> StoreResult<bool> {
        let key = key.into();
        self.shared.view(|cache| Ok(cache.contains(&key)))
    }

    /// Record stored under `key`, if any.
    ///
    /// Keys match by their canonical JSON text, so `1`, `1.0` and `"1"` are
    /// three different keys.
    pub fn get(&self, key: impl Into<Value>) -> StoreResult<Option<Record>> {
        let key = key.into();
        let found = self.shared.view(|cache| Ok(cache.contains(&key)))?;
        Ok(found.then(|| Record::new(&self.shared, key)))
    }

    /// Record stored under `key`; `PIPEDB_KEY_NOT_FOUND` if absent
    pub fn record(&self, key: impl Into<Value>) -> StoreResult<Record> {
        let key = key.into();
        self.get(key.clone())?
            .ok_or_else(|| StoreError::key_not_found(&key))
    }

    /// Stores `fields` under `key`, replacing any existing row.
    ///
    /// `key` overrides whatever primary key `fields` carries. Positional
    /// values may omit the primary key.
    ///
    /// # Errors
    ///
    /// `PIPEDB_HEADERS_MISMATCH` if the values do not cover the schema
    /// exactly.
    pub fn set(&self, key: impl Into<Value>, fields: impl Into<Fields>) -> StoreResult<Record> {
        let key = key.into();
        let fields = fields.into();
        self.shared.mutate(|schema, cache| {
            let row = fields.resolve(schema, Some(&key))?;
            cache.insert(row);
            Ok(((), true))
        })?;
        Ok(Record::new(&self.shared, key))
    }

    /// Inserts a new row keyed by its own primary-key value.
    ///
    /// The existence check and the insert happen under one lock hold, so
    /// two handles adding the same key cannot both succeed. Keys match by
    /// canonical JSON text: a row keyed `1.0` does not collide with `1`.
    ///
    /// # Errors
    ///
    /// - `PIPEDB_HEADERS_MISMATCH` if the values do not cover the schema
    ///   exactly (the primary key included)
    /// - `PIPEDB_KEY_EXISTS` if the key is already present; the stored row
    ///   is left as it was
    pub fn add(&self, fields: impl Into<Fields>) -> StoreResult<Record> {
        let fields = fields.into();
        let key = self.shared.mutate(|schema, cache| {
            let row = fields.resolve(schema, None)?;
            let key = row[0].clone();
            if cache.contains(&key) {
                return Err(StoreError::key_exists(&key));
            }
            cache.insert(row);
            Ok((key, true))
        })?;
        Ok(Record::new(&self.shared, key))
    }

    /// Deletes the row under `key`; `PIPEDB_KEY_NOT_FOUND` if absent
    pub fn delete(&self, key: impl Into<Value>) -> StoreResult<()> {
        self.remove(key).map(|_| ())
    }

    /// Deletes the row under `key` and returns its values
    pub fn remove(&self, key: impl Into<Value>) -> StoreResult<Fields> {
        let key = key.into();
        let row = self.shared.mutate(|_, cache| {
            let row = cache
                .remove(&key)
                .ok_or_else(|| StoreError::key_not_found(&key))?;
            Ok((row, true))
        })?;
        let schema = self.schema().fields().iter().cloned();
        Ok(Fields::named(schema.zip(row)))
    }

    /// Primary keys in row order
    pub fn keys(&self) -> StoreResult<Vec<Value>> {
        self.shared.view(|cache| Ok(cache.keys().cloned().collect()))
    }

    /// Handles on every row, in row order
    pub fn values(&self) -> StoreResult<Vec<Record>> {
        Ok(self
            .keys()?
            .into_iter()
            .map(|key| Record::new(&self.shared, key))
            .collect())
    }

    /// Detached copies of every row, in row order
    pub fn snapshot(&self) -> StoreResult<Vec<Fields>> {
        Ok(self
            .shared
            .snapshot()?
            .into_iter()
            .map(Fields::named)
            .collect())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path())
            .field("schema", &self.schema().fields())
            .finish()
    }
}
