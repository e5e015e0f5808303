//! State shared by a store and its records
//!
//! Lock order is always state mutex, then file lock. The file lock's hold
//! count is therefore only ever touched by the thread holding the mutex.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use serde_json::Value;

use super::config::StoreConfig;
use super::errors::{StoreError, StoreResult};
use super::reader::load_table;
use super::table::Table;
use super::writer::{modified_time, write_table};
use crate::lock::FileLock;
use crate::observability::{log_event, Event, StoreMetrics};
use crate::schema::Schema;

/// Cache and the file mtime it reflects
pub(crate) struct State {
    pub(crate) cache: Table,
    mtime: Option<SystemTime>,
}

pub(crate) struct Shared {
    path: PathBuf,
    schema: Schema,
    config: StoreConfig,
    lock: FileLock,
    metrics: Arc<StoreMetrics>,
    state: Mutex<State>,
}

impl Shared {
    /// Opens the table at `config.path`, creating it if absent.
    pub(crate) fn open(config: StoreConfig) -> StoreResult<Arc<Self>> {
        config.validate()?;

        let path = config.path.clone();
        let metrics = Arc::new(StoreMetrics::new());
        let lock = FileLock::with_metrics(&path, config.lock.clone(), Arc::clone(&metrics));

        if !path.exists() {
            if config.schema.is_none() {
                return Err(StoreError::headers_missing(&path));
            }
            if config.create_parent_dirs {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| {
                        StoreError::io("failed to create parent directories", parent, e)
                    })?;
                }
            }
        }

        let (schema, cache, mtime) = {
            let _guard = lock.acquire()?;

            // Re-checked under the lock: another process may have created it.
            match config.schema.clone().filter(|_| !path.exists()) {
                Some(schema) => {
                    let cache = Table::new();
                    let mtime =
                        write_table(&path, &schema, &cache, config.pad_columns, config.atomic_write)?;
                    metrics.increment_table_writes();
                    let (shown, fields) = (path.display().to_string(), schema.to_string());
                    log_event(
                        Event::StoreCreate,
                        &[("path", shown.as_str()), ("fields", fields.as_str())],
                    );
                    (schema, cache, mtime)
                }
                None => {
                    let mtime = modified_time(&path)?;
                    metrics.increment_table_parses();
                    let (schema, cache) = load_table(&path, config.schema.as_ref())?;
                    let (shown, fields) = (path.display().to_string(), schema.to_string());
                    let rows = cache.len().to_string();
                    log_event(
                        Event::StoreOpen,
                        &[
                            ("path", shown.as_str()),
                            ("fields", fields.as_str()),
                            ("rows", rows.as_str()),
                        ],
                    );
                    (schema, cache, mtime)
                }
            }
        };

        Ok(Arc::new(Self {
            path,
            schema,
            config,
            lock,
            metrics,
            state: Mutex::new(State {
                cache,
                mtime: Some(mtime),
            }),
        }))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    fn shown_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Poisoning is ignored: the cache is only replaced wholesale or
    /// edited by single assignments.
    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read protocol. Reloads the cache if the file's mtime is newer than
    /// the last one observed; returns whether it did.
    ///
    /// On failure the previous cache and mtime are kept.
    pub(crate) fn refresh(&self, state: &mut State) -> StoreResult<bool> {
        self.metrics.increment_freshness_checks();
        let current = modified_time(&self.path)?;
        if state.mtime.map_or(false, |seen| current <= seen) {
            return Ok(false);
        }

        let _guard = self.lock.acquire()?;
        let mtime = modified_time(&self.path)?;
        self.metrics.increment_table_parses();

        match load_table(&self.path, Some(&self.schema)) {
            Ok((_, cache)) => {
                let rows = cache.len().to_string();
                log_event(
                    Event::CacheRefresh,
                    &[("path", self.shown_path().as_str()), ("rows", rows.as_str())],
                );
                state.cache = cache;
                state.mtime = Some(mtime);
                Ok(true)
            }
            Err(e) => {
                let error = e.to_string();
                log_event(
                    Event::ReadFailed,
                    &[("path", self.shown_path().as_str()), ("error", error.as_str())],
                );
                Err(e)
            }
        }
    }

    /// Write protocol. Serializes the whole cache and records the new mtime.
    ///
    /// If the write fails the observed mtime is cleared, so the next read
    /// reloads from disk and drops whatever the file never received.
    pub(crate) fn persist(&self, state: &mut State) -> StoreResult<()> {
        let _guard = self.lock.acquire()?;
        let written = write_table(
            &self.path,
            &self.schema,
            &state.cache,
            self.config.pad_columns,
            self.config.atomic_write,
        );

        match written {
            Ok(mtime) => {
                state.mtime = Some(mtime);
                self.metrics.increment_table_writes();
                let rows = state.cache.len().to_string();
                log_event(
                    Event::TableWrite,
                    &[("path", self.shown_path().as_str()), ("rows", rows.as_str())],
                );
                Ok(())
            }
            Err(e) => {
                state.mtime = None;
                Err(e)
            }
        }
    }

    /// Runs `f` against a fresh cache with the file lock held throughout,
    /// persisting afterwards if `f` reports a change.
    pub(crate) fn mutate<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Schema, &mut Table) -> StoreResult<(T, bool)>,
    {
        let mut state = self.state();
        let _guard = self.lock.acquire()?;
        self.refresh(&mut state)?;

        let (out, changed) = f(&self.schema, &mut state.cache)?;
        if changed {
            self.persist(&mut state)?;
        }
        Ok(out)
    }

    /// Runs `f` against a fresh cache without taking the file lock unless
    /// the file changed.
    pub(crate) fn view<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Table) -> StoreResult<T>,
    {
        let mut state = self.state();
        self.refresh(&mut state)?;
        f(&state.cache)
    }

    fn field_index(&self, field: &str) -> StoreResult<usize> {
        self.schema
            .position(field)
            .ok_or_else(|| StoreError::unknown_field(field))
    }

    fn named(&self, row: &[Value]) -> Vec<(String, Value)> {
        self.schema
            .fields()
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect()
    }

    pub(crate) fn record_get(&self, key: &Value, field: &str) -> StoreResult<Value> {
        let idx = self.field_index(field)?;
        self.view(|cache| {
            cache
                .get(key)
                .map(|row| row[idx].clone())
                .ok_or_else(|| StoreError::key_not_found(key))
        })
    }

    pub(crate) fn record_set(&self, key: &Value, field: &str, value: Value) -> StoreResult<()> {
        let idx = self.field_index(field)?;
        if idx == 0 {
            return Err(StoreError::read_only_field(field));
        }

        let unchanged = self.view(|cache| {
            cache
                .get(key)
                .map(|row| row[idx] == value)
                .ok_or_else(|| StoreError::key_not_found(key))
        })?;

        let written = if unchanged {
            false
        } else {
            self.mutate(|_, cache| {
                let row = cache
                    .get_mut(key)
                    .ok_or_else(|| StoreError::key_not_found(key))?;
                if row[idx] == value {
                    return Ok((false, false));
                }
                row[idx] = value;
                Ok((true, true))
            })?
        };

        if !written {
            self.metrics.increment_skipped_writes();
            let shown_key = key.to_string();
            log_event(
                Event::RecordWriteSkipped,
                &[
                    ("path", self.shown_path().as_str()),
                    ("key", shown_key.as_str()),
                    ("field", field),
                ],
            );
        }
        Ok(())
    }

    pub(crate) fn record_fields(&self, key: &Value) -> StoreResult<Vec<(String, Value)>> {
        self.view(|cache| {
            cache
                .get(key)
                .map(|row| self.named(row))
                .ok_or_else(|| StoreError::key_not_found(key))
        })
    }

    /// Row as `(field, value)` pairs straight from the cache, no refresh
    pub(crate) fn cached_fields(&self, key: &Value) -> Option<Vec<(String, Value)>> {
        self.state().cache.get(key).map(|row| self.named(row))
    }

    /// Rows as `(field, value)` pairs after a refresh
    pub(crate) fn snapshot(&self) -> StoreResult<Vec<Vec<(String, Value)>>> {
        self.view(|cache| Ok(cache.rows().map(|row| self.named(row)).collect()))
    }
}
