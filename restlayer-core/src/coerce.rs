//! Type coercion of raw query-string values.
//!
//! Flat query parameters arrive as strings. [`coerce`] turns one raw value into a
//! [`TypedValue`] using the type the schema declares for the field. Coercion never fails:
//! values that cannot be parsed become sentinels ([`TypedValue::NotANumber`],
//! [`TypedValue::InvalidDate`]) which match nothing once they reach the store.
//!
//! The precedence rules are applied in this order:
//!
//! 1. the null literal (`"null"`) is null for every field type;
//! 2. a value containing the list separator (`,`) is split into a list of trimmed,
//!    non-empty strings, whatever the declared type is;
//! 3. otherwise the value is dispatched on the declared [`FieldType`].
//!
//! Rule 2 also applies to booleans and dates, and boolean coercion treats every value
//! other than the exact string `"true"` as `false`. Both behaviours are relied upon by
//! existing callers and are kept as-is.
//!
//! Sentinels render as `NaN`, which only means "no match" under equality, range and `$in`.
//! Negated operators invert that: `age$ne=abc` becomes `{ age: { $ne: NaN } }` and matches
//! every document whose `age` is not `NaN`.

use bson::Bson;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{
    config::TranslatorConfig,
    schema::{FieldType, SchemaDescriptor},
};


/// A raw query value after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// The null literal.
    Null,
    /// A string, passed through unchanged.
    String(String),
    /// A comma separated value, split into its non-empty fragments.
    List(Vec<String>),
    /// A number without a decimal point.
    Integer(i64),
    /// A number with a decimal point.
    Float(f64),
    /// A `number` field whose raw value did not parse.
    NotANumber,
    /// A parsed date.
    Date(DateTime<Utc>),
    /// A `date` field whose raw value did not parse.
    InvalidDate,
    /// A boolean.
    Boolean(bool),
}

impl TypedValue {
    /// Returns `true` for the sentinels produced by failed number or date parsing.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, TypedValue::NotANumber | TypedValue::InvalidDate)
    }
}

impl From<TypedValue> for Bson {
    fn from(value: TypedValue) -> Self {
        match value {
            TypedValue::Null => Bson::Null,
            TypedValue::String(s) => Bson::String(s),
            TypedValue::List(items) => Bson::Array(items.into_iter().map(Bson::String).collect()),
            TypedValue::Integer(i) => Bson::Int64(i),
            TypedValue::Float(f) => Bson::Double(f),
            TypedValue::Date(date) => Bson::DateTime(bson::DateTime::from_chrono(date)),
            // NaN compares equal to no date and no ordinary number
            TypedValue::NotANumber | TypedValue::InvalidDate => Bson::Double(f64::NAN),
            TypedValue::Boolean(b) => Bson::Boolean(b),
        }
    }
}


/// Coerces raw strings into typed values with a configurable null literal and list separator.
#[derive(Debug, Clone)]
pub struct ValueCoercer {
    list_separator: char,
    null_literal: String,
}

impl Default for ValueCoercer {
    fn default() -> Self {
        Self::from_config(&TranslatorConfig::default())
    }
}

impl ValueCoercer {
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            list_separator: config.list_separator,
            null_literal: config.null_literal.clone(),
        }
    }

    /// Coerces `raw` according to the type `schema` declares for `field`.
    pub fn coerce(&self, field: &str, raw: &str, schema: &SchemaDescriptor) -> TypedValue {
        if raw == self.null_literal {
            return TypedValue::Null;
        }

        if raw.contains(self.list_separator) {
            return TypedValue::List(
                raw.split(self.list_separator)
                    .map(str::trim)
                    .filter(|fragment| !fragment.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }

        match schema.field_type(field) {
            FieldType::String => TypedValue::String(raw.to_string()),
            FieldType::Number => parse_number(raw),
            FieldType::Date => parse_date(raw),
            FieldType::Boolean => TypedValue::Boolean(raw == "true"),
            FieldType::Identifier | FieldType::Array | FieldType::Unsupported => {
                TypedValue::String(raw.to_string())
            }
            FieldType::Binary | FieldType::Mixed => TypedValue::Null,
        }
    }
}

/// Coerces `raw` with the default null literal and list separator.
pub fn coerce(field: &str, raw: &str, schema: &SchemaDescriptor) -> TypedValue {
    ValueCoercer::default().coerce(field, raw, schema)
}

fn parse_number(raw: &str) -> TypedValue {
    if raw.contains('.') {
        raw.parse::<f64>()
            .map(TypedValue::Float)
            .unwrap_or(TypedValue::NotANumber)
    } else {
        raw.parse::<i64>()
            .map(TypedValue::Integer)
            .unwrap_or(TypedValue::NotANumber)
    }
}

fn parse_date(raw: &str) -> TypedValue {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return TypedValue::Date(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return TypedValue::Date(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return TypedValue::Date(date.and_utc());
    }

    // Date-only values are midnight UTC.
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| TypedValue::Date(date.and_utc()))
        .unwrap_or(TypedValue::InvalidDate)
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::from_iter([
            ("name", FieldType::String),
            ("age", FieldType::Number),
            ("birth", FieldType::Date),
            ("active", FieldType::Boolean),
            ("owner", FieldType::Identifier),
            ("tags", FieldType::Array),
            ("avatar", FieldType::Binary),
            ("extra", FieldType::Mixed),
        ])
    }

    #[test]
    fn null_literal_wins_for_every_type() {
        let schema = schema();

        for field in ["name", "age", "birth", "active", "owner", "tags", "avatar", "missing"] {
            assert_eq!(coerce(field, "null", &schema), TypedValue::Null, "field {field}");
        }

        // case-sensitive
        assert_eq!(coerce("name", "NULL", &schema), TypedValue::String("NULL".into()));
    }

    #[test]
    fn numbers_split_on_decimal_point() {
        let schema = schema();

        assert_eq!(coerce("age", "3.5", &schema), TypedValue::Float(3.5));
        assert_eq!(coerce("age", "3", &schema), TypedValue::Integer(3));
        assert_eq!(coerce("age", "-12", &schema), TypedValue::Integer(-12));
        assert_eq!(coerce("age", "abc", &schema), TypedValue::NotANumber);
        assert_eq!(coerce("age", "1.2.3", &schema), TypedValue::NotANumber);
        assert_eq!(coerce("age", "", &schema), TypedValue::NotANumber);
    }

    #[test]
    fn only_literal_true_is_true() {
        let schema = schema();

        assert_eq!(coerce("active", "true", &schema), TypedValue::Boolean(true));
        assert_eq!(coerce("active", "false", &schema), TypedValue::Boolean(false));
        assert_eq!(coerce("active", "yes", &schema), TypedValue::Boolean(false));
        assert_eq!(coerce("active", "TRUE", &schema), TypedValue::Boolean(false));
    }

    #[test]
    fn dates_parse_or_become_invalid() {
        let schema = schema();

        assert_eq!(
            coerce("birth", "2020-05-17T10:30:00Z", &schema),
            TypedValue::Date(Utc.with_ymd_and_hms(2020, 5, 17, 10, 30, 0).unwrap()),
        );
        assert_eq!(
            coerce("birth", "2020-05-17T12:30:00+02:00", &schema),
            TypedValue::Date(Utc.with_ymd_and_hms(2020, 5, 17, 10, 30, 0).unwrap()),
        );
        assert_eq!(
            coerce("birth", "2020-05-17", &schema),
            TypedValue::Date(Utc.with_ymd_and_hms(2020, 5, 17, 0, 0, 0).unwrap()),
        );
        assert_eq!(
            coerce("birth", "Sun, 17 May 2020 10:30:00 +0000", &schema),
            TypedValue::Date(Utc.with_ymd_and_hms(2020, 5, 17, 10, 30, 0).unwrap()),
        );
        assert_eq!(
            coerce("birth", "2020-05-17T10:30:00", &schema),
            TypedValue::Date(Utc.with_ymd_and_hms(2020, 5, 17, 10, 30, 0).unwrap()),
        );
        assert_eq!(
            coerce("birth", "2020-05-17T10:30:00.250", &schema),
            TypedValue::Date(
                Utc.with_ymd_and_hms(2020, 5, 17, 10, 30, 0).unwrap() + TimeDelta::milliseconds(250),
            ),
        );
        assert_eq!(coerce("birth", "yesterday", &schema), TypedValue::InvalidDate);
        assert!(coerce("birth", "yesterday", &schema).is_sentinel());
        assert!(coerce("age", "abc", &schema).is_sentinel());
        assert!(!coerce("age", "3", &schema).is_sentinel());
    }

    #[test]
    fn comma_lists_override_declared_type() {
        let schema = schema();

        assert_eq!(
            coerce("age", "1, 2,,3 ", &schema),
            TypedValue::List(vec!["1".into(), "2".into(), "3".into()]),
        );
        assert_eq!(
            coerce("active", "true,false", &schema),
            TypedValue::List(vec!["true".into(), "false".into()]),
        );
        assert_eq!(coerce("name", " , ", &schema), TypedValue::List(vec![]));
    }

    #[test]
    fn pass_through_and_null_types() {
        let schema = schema();

        assert_eq!(coerce("name", "Tom", &schema), TypedValue::String("Tom".into()));
        assert_eq!(
            coerce("owner", "507f1f77bcf86cd799439011", &schema),
            TypedValue::String("507f1f77bcf86cd799439011".into()),
        );
        assert_eq!(coerce("tags", "red", &schema), TypedValue::String("red".into()));
        assert_eq!(coerce("missing", "x", &schema), TypedValue::String("x".into()));
        assert_eq!(coerce("avatar", "AAEC", &schema), TypedValue::Null);
        assert_eq!(coerce("extra", "{}", &schema), TypedValue::Null);
    }

    #[test]
    fn custom_separator_and_null_literal() {
        let coercer = ValueCoercer::from_config(&TranslatorConfig {
            list_separator: '|',
            null_literal: "nil".into(),
            ..TranslatorConfig::default()
        });
        let schema = schema();

        assert_eq!(coercer.coerce("age", "nil", &schema), TypedValue::Null);
        assert_eq!(coercer.coerce("name", "null", &schema), TypedValue::String("null".into()));
        assert_eq!(coercer.coerce("age", "1,5", &schema), TypedValue::NotANumber);
        assert_eq!(
            coercer.coerce("name", "a|b", &schema),
            TypedValue::List(vec!["a".into(), "b".into()]),
        );
    }

    #[test]
    fn sentinels_render_as_nan() {
        assert!(matches!(Bson::from(TypedValue::NotANumber), Bson::Double(f) if f.is_nan()));
        assert!(matches!(Bson::from(TypedValue::InvalidDate), Bson::Double(f) if f.is_nan()));
        assert_eq!(Bson::from(TypedValue::Integer(3)), Bson::Int64(3));
        assert_eq!(
            Bson::from(TypedValue::List(vec!["a".into()])),
            Bson::Array(vec![Bson::String("a".into())]),
        );
    }
}
