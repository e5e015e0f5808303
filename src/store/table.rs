//! In-memory table cache
//!
//! Rows are kept in insertion order; an index maps each primary key's
//! canonical literal to its row. Overwriting a key replaces the row in
//! place, so order only changes on insert and delete.

use std::collections::HashMap;

use serde_json::Value;

/// Canonical index key for a primary-key value
fn index_key(key: &Value) -> String {
    key.to_string()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Table {
    rows: Vec<Vec<Value>>,
    index: HashMap<String, usize>,
}

impl Table {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn contains(&self, key: &Value) -> bool {
        self.index.contains_key(&index_key(key))
    }

    pub(crate) fn get(&self, key: &Value) -> Option<&[Value]> {
        self.index
            .get(&index_key(key))
            .map(|&idx| self.rows[idx].as_slice())
    }

    pub(crate) fn get_mut(&mut self, key: &Value) -> Option<&mut Vec<Value>> {
        match self.index.get(&index_key(key)) {
            Some(&idx) => self.rows.get_mut(idx),
            None => None,
        }
    }

    /// Stores `row` under its first value. Returns true if it replaced an
    /// existing row.
    pub(crate) fn insert(&mut self, row: Vec<Value>) -> bool {
        let key = index_key(&row[0]);
        match self.index.get(&key) {
            Some(&idx) => {
                self.rows[idx] = row;
                true
            }
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(row);
                false
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &Value) -> Option<Vec<Value>> {
        let idx = self.index.remove(&index_key(key))?;
        let row = self.rows.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Some(row)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(|row| &row[0])
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(key: &str, name: &str) -> Vec<Value> {
        vec![json!(key), json!(name)]
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut table = Table::new();
        assert!(!table.insert(row("b", "x")));
        assert!(!table.insert(row("a", "y")));
        let keys: Vec<&Value> = table.keys().collect();
        assert_eq!(keys, vec![&json!("b"), &json!("a")]);
    }

    #[test]
    fn test_overwrite_replaces_in_place() {
        let mut table = Table::new();
        table.insert(row("1", "a"));
        table.insert(row("2", "b"));
        assert!(table.insert(row("1", "c")));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&json!("1")).unwrap()[1], json!("c"));
        assert_eq!(table.keys().next(), Some(&json!("1")));
    }

    #[test]
    fn test_keys_distinguish_types() {
        let mut table = Table::new();
        table.insert(vec![json!("1"), json!("string")]);
        table.insert(vec![json!(1), json!("number")]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&json!(1)).unwrap()[1], json!("number"));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut table = Table::new();
        table.insert(row("1", "a"));
        table.insert(row("2", "b"));
        table.insert(row("3", "c"));

        assert_eq!(table.remove(&json!("1")), Some(row("1", "a")));
        assert!(table.remove(&json!("1")).is_none());
        assert_eq!(table.get(&json!("3")).unwrap()[1], json!("c"));
        assert!(!table.contains(&json!("1")));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_get_mut_updates_row() {
        let mut table = Table::new();
        table.insert(row("1", "a"));
        table.get_mut(&json!("1")).unwrap()[1] = json!("z");
        assert_eq!(table.get(&json!("1")).unwrap()[1], json!("z"));
        assert!(table.get_mut(&json!("9")).is_none());
    }
}
