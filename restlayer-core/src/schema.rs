//! Per-collection field type descriptors.
//!
//! A [`SchemaDescriptor`] tells the coercion layer which primitive type a field was
//! declared with. It is supplied by the application once per collection and never
//! mutated afterwards. Lookups for fields the schema does not know about yield
//! [`FieldType::Unsupported`].
//!
//! # Example
//!
//! ```ignore
//! use restlayer_core::schema::{FieldType, SchemaDescriptor};
//!
//! let schema = SchemaDescriptor::from_iter([
//!     ("name", FieldType::String),
//!     ("age", FieldType::Number),
//!     ("birth", FieldType::Date),
//! ]);
//!
//! assert_eq!(schema.field_type("age"), FieldType::Number);
//! assert_eq!(schema.field_type("missing"), FieldType::Unsupported);
//! ```

use std::{collections::HashMap, convert::Infallible, str::FromStr};
use serde::{Deserialize, Deserializer, Serialize, Serializer};


/// Declared primitive type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Text values, passed through unchanged.
    String,
    /// Integer or floating point numbers.
    Number,
    /// Date-time values.
    Date,
    /// `true` / `false`.
    Boolean,
    /// The store's native identifier type.
    Identifier,
    /// Array fields.
    Array,
    /// Binary blobs. Not coercible from a query string.
    Binary,
    /// Schemaless values. Not coercible from a query string.
    Mixed,
    /// Any type the descriptor does not know, including absent fields.
    Unsupported,
}

impl FieldType {
    /// Returns the canonical lowercase name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Identifier => "identifier",
            FieldType::Array => "array",
            FieldType::Binary => "binary",
            FieldType::Mixed => "mixed",
            FieldType::Unsupported => "unsupported",
        }
    }
}

impl FromStr for FieldType {
    type Err = Infallible;

    /// Parses a type name case-insensitively. Unknown names yield `Unsupported`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "boolean" | "bool" => FieldType::Boolean,
            "identifier" | "objectid" | "id" => FieldType::Identifier,
            "array" => FieldType::Array,
            "binary" | "buffer" => FieldType::Binary,
            "mixed" => FieldType::Mixed,
            _ => FieldType::Unsupported,
        })
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        // `from_str` is infallible
        Ok(name.parse().unwrap_or(FieldType::Unsupported))
    }
}


/// Immutable mapping from field name to declared [`FieldType`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDescriptor {
    fields: HashMap<String, FieldType>,
}

impl SchemaDescriptor {
    /// Creates an empty schema. Every lookup on it yields `Unsupported`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the declared type of `field`, or `Unsupported` if the field is not declared.
    pub fn field_type(&self, field: &str) -> FieldType {
        self.fields
            .get(field)
            .copied()
            .unwrap_or(FieldType::Unsupported)
    }

    /// Returns `true` if the schema declares `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldType)> for SchemaDescriptor {
    fn from_iter<I: IntoIterator<Item = (K, FieldType)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_unsupported() {
        let schema = SchemaDescriptor::from_iter([("age", FieldType::Number)]);

        assert_eq!(schema.field_type("age"), FieldType::Number);
        assert_eq!(schema.field_type("name"), FieldType::Unsupported);
        assert_eq!(SchemaDescriptor::new().field_type("age"), FieldType::Unsupported);
    }

    #[test]
    fn type_names_parse_case_insensitively() {
        assert_eq!("Number".parse::<FieldType>().unwrap(), FieldType::Number);
        assert_eq!("ObjectId".parse::<FieldType>().unwrap(), FieldType::Identifier);
        assert_eq!("Buffer".parse::<FieldType>().unwrap(), FieldType::Binary);
        assert_eq!("Decimal128".parse::<FieldType>().unwrap(), FieldType::Unsupported);
    }

    #[test]
    fn deserializes_from_json_map() {
        let schema: SchemaDescriptor = serde_json::from_value(serde_json::json!({
            "name": "String",
            "age": "number",
            "owner": "objectid",
            "blob": "uuid",
        }))
        .unwrap();

        assert_eq!(schema.len(), 4);
        assert_eq!(schema.field_type("name"), FieldType::String);
        assert_eq!(schema.field_type("owner"), FieldType::Identifier);
        assert_eq!(schema.field_type("blob"), FieldType::Unsupported);
    }
}
