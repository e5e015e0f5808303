//! Unbound field values

use serde_json::{Map, Value};

use crate::schema::Schema;
use crate::store::{StoreError, StoreResult};

/// Field values not yet bound to a store.
///
/// Values can be given positionally, by name, or both. Positional values
/// follow schema order; if the total number of values is one short of the
/// schema, the positional values start at the second field and the
/// primary key is expected to come from the key they are stored under.
///
/// ```
/// use pipedb::Fields;
/// use serde_json::json;
///
/// let by_position = Fields::positional(["1", "alice"]).push(true);
/// let by_name = Fields::new().with("name", "alice").with("active", true);
/// assert_eq!(by_position.len(), 3);
/// assert_eq!(by_name.get("name"), Some(&json!("alice")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl Fields {
    /// An empty value set
    pub fn new() -> Self {
        Self::default()
    }

    /// Values in schema order
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: Vec::new(),
        }
    }

    /// Values by field name
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            positional: Vec::new(),
            named: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Appends a positional value
    pub fn push(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named value; a later value for the same name wins
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.named.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.named.push((name, value)),
        }
        self
    }

    /// Named value lookup (positional values have no name until bound)
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Named values in insertion order
    pub fn named_values(&self) -> &[(String, Value)] {
        &self.named
    }

    /// Total number of values supplied
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Whether no values were supplied
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Binds the values to `schema`, yielding one value per field in
    /// schema order.
    ///
    /// `key`, when given, overwrites whatever primary key the values carry.
    ///
    /// # Errors
    ///
    /// `PIPEDB_HEADERS_MISMATCH` if a name is not in the schema, there are
    /// more positional values than fields, or any field is left without a
    /// value.
    pub(crate) fn resolve(&self, schema: &Schema, key: Option<&Value>) -> StoreResult<Vec<Value>> {
        let width = schema.len();
        let offset = usize::from(self.len() < width);

        if self.positional.len() + offset > width {
            return Err(StoreError::fields_mismatch(format!(
                "{} positional values for {} fields",
                self.positional.len(),
                width
            )));
        }

        let mut slots: Vec<Option<Value>> = vec![None; width];
        for (idx, value) in self.positional.iter().enumerate() {
            slots[idx + offset] = Some(value.clone());
        }
        for (name, value) in &self.named {
            let idx = schema
                .position(name)
                .ok_or_else(|| StoreError::fields_mismatch(format!("unknown field: {}", name)))?;
            slots[idx] = Some(value.clone());
        }
        if let Some(key) = key {
            slots[0] = Some(key.clone());
        }

        let missing: Vec<&str> = schema
            .fields()
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(name, _)| name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::fields_mismatch(format!(
                "missing fields: {}",
                missing.join(", ")
            )));
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self::named(map)
    }
}
