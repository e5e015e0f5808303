//! The `Schema` type

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};

/// An ordered, duplicate-free list of field names.
///
/// The first field is the primary key. A `Schema` can only be built
/// through [`Schema::new`], so every instance is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Schema {
    fields: Vec<String>,
}

impl Schema {
    /// Builds a schema from field names in order.
    ///
    /// # Errors
    ///
    /// Fails if the list is empty, a name is empty or duplicated, or a name
    /// contains the column delimiter, a quote, a line break, or
    /// leading/trailing whitespace (headers are trimmed on read).
    pub fn new<I, S>(fields: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::with_capacity(fields.len());
        for (position, name) in fields.iter().enumerate() {
            if name.is_empty() {
                return Err(SchemaError::EmptyName(position));
            }
            if let Some(reason) = invalid_name_reason(name) {
                return Err(SchemaError::InvalidName {
                    name: name.clone(),
                    reason,
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateField(name.clone()));
            }
        }

        Ok(Self { fields })
    }

    /// Field names in order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Name of the primary key field
    pub fn primary_key(&self) -> &str {
        &self.fields[0]
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column index of `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Whether `name` is one of the schema's fields
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Whether `name` is the primary key field
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key() == name
    }
}

fn invalid_name_reason(name: &str) -> Option<&'static str> {
    if name.trim() != name {
        return Some("leading or trailing whitespace");
    }
    if name.contains('|') {
        return Some("contains the column delimiter '|'");
    }
    if name.contains('"') || name.contains('\'') {
        return Some("contains a quote character");
    }
    if name.contains('\n') || name.contains('\r') {
        return Some("contains a line break");
    }
    None
}

impl TryFrom<Vec<String>> for Schema {
    type Error = SchemaError;

    fn try_from(fields: Vec<String>) -> SchemaResult<Self> {
        Self::new(fields)
    }
}

impl From<Schema> for Vec<String> {
    fn from(schema: Schema) -> Self {
        schema.fields
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_field_is_primary_key() {
        let schema = Schema::new(["id", "name", "active"]).unwrap();
        assert_eq!(schema.primary_key(), "id");
        assert!(schema.is_primary_key("id"));
        assert!(!schema.is_primary_key("name"));
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.position("active"), Some(2));
        assert!(!schema.contains("missing"));
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert_eq!(
            Schema::new(Vec::<String>::new()).unwrap_err(),
            SchemaError::Empty
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        assert_eq!(
            Schema::new(["id", "name", "id"]).unwrap_err(),
            SchemaError::DuplicateField("id".to_string())
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            Schema::new(["id", ""]).unwrap_err(),
            SchemaError::EmptyName(1)
        );
    }

    #[test]
    fn test_names_that_break_the_header_rejected() {
        for bad in ["a|b", "quo\"te", "it's", "line\nbreak", " padded"] {
            assert!(
                matches!(
                    Schema::new(["id", bad]),
                    Err(SchemaError::InvalidName { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_serde_validates() {
        let schema: Schema = serde_json::from_str(r#"["id","name"]"#).unwrap();
        assert_eq!(schema.fields(), ["id", "name"]);
        assert!(serde_json::from_str::<Schema>("[]").is_err());
        assert_eq!(serde_json::to_string(&schema).unwrap(), r#"["id","name"]"#);
    }
}
