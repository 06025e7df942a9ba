//! Translator configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all) is a valid
//! configuration:
//!
//! ```ignore
//! use restlayer_core::config::TranslatorConfig;
//!
//! let config: TranslatorConfig = serde_json::from_str(r#"{ "operator_delimiter": ":" }"#)?;
//! ```

use serde::{Deserialize, Serialize};


/// Options controlling how flat query parameters are parsed and coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Separator between the field name and the operator suffix in a flat key (`age$gte`).
    pub operator_delimiter: char,
    /// Separator that turns a raw value into a list of strings (`a,b,c`).
    pub list_separator: char,
    /// Raw value that coerces to null regardless of the declared field type.
    pub null_literal: String,
    /// Whether filters built from flat query parameters are also passed through
    /// the identifier resolver.
    pub resolve_query_identifiers: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            operator_delimiter: '$',
            list_separator: ',',
            null_literal: "null".to_string(),
            resolve_query_identifiers: true,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: TranslatorConfig = serde_json::from_str(r#"{ "operator_delimiter": ":" }"#).unwrap();

        assert_eq!(config.operator_delimiter, ':');
        assert_eq!(config.list_separator, ',');
        assert_eq!(config.null_literal, "null");
        assert!(config.resolve_query_identifiers);
    }
}
