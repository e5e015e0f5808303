//! Store-bound record handle

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;

use super::fields::Fields;
use crate::store::{Shared, StoreError, StoreResult};

/// A handle on one row of a store.
///
/// The handle holds the row's primary key and a non-owning reference to
/// the store. It carries no field values of its own: reads refresh the
/// store's cache from disk when the file has changed and then look the row
/// up, so a handle never serves values older than the store's cache.
///
/// - [`get`](Self::get) fails with `PIPEDB_UNKNOWN_FIELD` for names outside
///   the schema.
/// - [`set`](Self::set) additionally fails with `PIPEDB_READ_ONLY_FIELD`
///   for the primary key, and skips the write when the value is unchanged.
/// - [`delete`](Self::delete) always fails with `PIPEDB_UNSUPPORTED`.
///
/// Once the row is deleted, field access fails with `PIPEDB_KEY_NOT_FOUND`;
/// once every `Store` clone is dropped, with `PIPEDB_STORE_CLOSED`.
#[derive(Clone)]
pub struct Record {
    store: Weak<Shared>,
    key: Value,
}

impl Record {
    pub(crate) fn new(store: &Arc<Shared>, key: Value) -> Self {
        Self {
            store: Arc::downgrade(store),
            key,
        }
    }

    fn store(&self) -> StoreResult<Arc<Shared>> {
        self.store.upgrade().ok_or_else(StoreError::store_closed)
    }

    /// Primary key value; never changes
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// Current value of `field`
    pub fn get(&self, field: &str) -> StoreResult<Value> {
        self.store()?.record_get(&self.key, field)
    }

    /// Assigns `field`, writing the table only if the value changed
    pub fn set(&self, field: &str, value: impl Into<Value>) -> StoreResult<()> {
        self.store()?.record_set(&self.key, field, value.into())
    }

    /// Field removal is never permitted
    pub fn delete(&self, field: &str) -> StoreResult<()> {
        Err(StoreError::unsupported(format!(
            "fields cannot be deleted: {}",
            field
        )))
    }

    /// `(field, value)` pairs in schema order, after a refresh
    pub fn fields(&self) -> StoreResult<Vec<(String, Value)>> {
        self.store()?.record_fields(&self.key)
    }

    /// A detached copy of the row, usable with `Store::set`
    pub fn to_fields(&self) -> StoreResult<Fields> {
        Ok(Fields::named(self.fields()?))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record").field("key", &self.key).finish()
    }
}

/// Renders the cached row without touching the file, e.g.
/// `Record(id="1", name="alice", active=true)`.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.store.upgrade().and_then(|s| s.cached_fields(&self.key));
        match cached {
            Some(pairs) => {
                write!(f, "Record(")?;
                for (idx, (name, value)) in pairs.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                write!(f, ")")
            }
            None => write!(f, "Record(<detached key={}>)", self.key),
        }
    }
}
