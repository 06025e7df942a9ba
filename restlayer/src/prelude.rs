//! Convenient re-exports of commonly used types from restlayer.
//!
//! ```ignore
//! use restlayer::prelude::*;
//! ```

pub use restlayer_core::{
    coerce::{TypedValue, ValueCoercer, coerce},
    config::TranslatorConfig,
    error::{TranslateError, TranslateResult},
    filter::{BsonRenderer, ClauseSet, FieldFilter, FilterClause, FilterParser, FilterTree, FilterVisitor, Operator, extract_conditions},
    identifier::{is_identifier_candidate, resolve_document, resolve_identifiers},
    schema::{FieldType, SchemaDescriptor},
    translate::{Translator, TranslatorBuilder},
};
