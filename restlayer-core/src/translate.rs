//! Per-collection request translation.
//!
//! A [`Translator`] composes the coercion, filter parsing and identifier resolution steps
//! for one collection. Each endpoint of an auto-generated REST service maps onto one method:
//!
//! | Endpoint                  | Input                | Method                            |
//! |---------------------------|----------------------|-----------------------------------|
//! | `GET /`                   | query parameters     | [`Translator::query_filter`]      |
//! | `DELETE /`                | query parameters     | [`Translator::query_filter`]      |
//! | `PATCH /`                 | query + JSON body    | `query_filter` + [`Translator::update_document`] |
//! | `POST /search`            | JSON object          | [`Translator::search_filter`]     |
//! | `POST /aggregate`         | JSON array           | [`Translator::aggregate_pipeline`] |
//! | `POST /`                  | JSON object          | [`Translator::insert_document`]   |
//!
//! # Example
//!
//! ```ignore
//! use restlayer_core::{schema::{FieldType, SchemaDescriptor}, translate::Translator};
//!
//! let translator = Translator::builder(SchemaDescriptor::from_iter([("age", FieldType::Number)]))
//!     .operator_delimiter('$')
//!     .build();
//!
//! let filter = translator.query_filter([("age$gte", "10")]);
//! let pipeline = translator.aggregate_pipeline(serde_json::json!([{ "$match": { "age": 3 } }]))?;
//! ```

use bson::{Bson, Document, doc, ser::serialize_to_bson};
use serde_json::Value;

use crate::{
    config::TranslatorConfig,
    error::{TranslateError, TranslateResult},
    filter::{FilterParser, FilterTree},
    identifier::{resolve_clauses, resolve_document, resolve_identifiers},
    schema::SchemaDescriptor,
};


/// Translates wire-level requests for one collection into store queries.
#[derive(Debug, Clone)]
pub struct Translator {
    schema: SchemaDescriptor,
    config: TranslatorConfig,
    parser: FilterParser,
}

impl Translator {
    /// Creates a translator with the default configuration.
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self::builder(schema).build()
    }

    pub fn builder(schema: SchemaDescriptor) -> TranslatorBuilder {
        TranslatorBuilder::new(schema)
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Parses flat query parameters into a filter tree.
    pub fn query_tree<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> FilterTree
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.parser.parse(params, &self.schema)
    }

    /// Builds a store filter from flat query parameters.
    ///
    /// With `resolve_query_identifiers` enabled, identifier-looking values of plain
    /// equality and `$in` clauses also match their native form. Other operators are left
    /// as written.
    pub fn query_filter<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> Document
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let filter = self.query_tree(params).to_document();

        if self.config.resolve_query_identifiers {
            resolve_clauses(&filter)
        } else {
            filter
        }
    }

    /// Builds a store filter from a JSON search body. A `null` body matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::InvalidBody`] if the body is not an object.
    pub fn search_filter(&self, body: Value) -> TranslateResult<Document> {
        match body {
            Value::Null => Ok(Document::new()),
            Value::Object(_) => Ok(resolve_document(&object_to_document(&body)?)),
            other => Err(TranslateError::InvalidBody(format!(
                "search body must be an object, got {}",
                json_kind(&other),
            ))),
        }
    }

    /// Builds an aggregation pipeline from a JSON body. A `null` body is the empty pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::InvalidBody`] if the body is not an array of objects.
    pub fn aggregate_pipeline(&self, body: Value) -> TranslateResult<Vec<Document>> {
        let stages = match body {
            Value::Null => return Ok(Vec::new()),
            Value::Array(stages) => stages,
            other => {
                return Err(TranslateError::InvalidBody(format!(
                    "aggregate body must be an array, got {}",
                    json_kind(&other),
                )));
            }
        };

        stages
            .iter()
            .enumerate()
            .map(|(index, stage)| match stage {
                Value::Object(_) => match resolve_identifiers(&serialize_to_bson(stage)?) {
                    Bson::Document(document) => Ok(document),
                    _ => Err(TranslateError::Serialization(format!(
                        "pipeline stage {index} did not convert to a document"
                    ))),
                },
                other => Err(TranslateError::InvalidBody(format!(
                    "pipeline stage {index} must be an object, got {}",
                    json_kind(other),
                ))),
            })
            .collect()
    }

    /// Builds an update document from a JSON body.
    ///
    /// Bodies without any top-level `$` operator are treated as field assignments and
    /// wrapped in `$set`.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::InvalidBody`] if the body is not an object.
    pub fn update_document(&self, body: Value) -> TranslateResult<Document> {
        let update = expect_object(&body, "update")?;

        if update.keys().any(|key| key.starts_with('$')) {
            Ok(update)
        } else {
            Ok(doc! { "$set": update })
        }
    }

    /// Converts a JSON body into a document to insert.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::InvalidBody`] if the body is not an object.
    pub fn insert_document(&self, body: Value) -> TranslateResult<Document> {
        expect_object(&body, "insert")
    }
}


/// Builder for [`Translator`].
#[derive(Debug, Clone)]
pub struct TranslatorBuilder {
    schema: SchemaDescriptor,
    config: TranslatorConfig,
}

impl TranslatorBuilder {
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self { schema, config: TranslatorConfig::default() }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: TranslatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn operator_delimiter(mut self, delimiter: char) -> Self {
        self.config.operator_delimiter = delimiter;
        self
    }

    pub fn list_separator(mut self, separator: char) -> Self {
        self.config.list_separator = separator;
        self
    }

    pub fn null_literal(mut self, literal: impl Into<String>) -> Self {
        self.config.null_literal = literal.into();
        self
    }

    pub fn resolve_query_identifiers(mut self, enabled: bool) -> Self {
        self.config.resolve_query_identifiers = enabled;
        self
    }

    pub fn build(self) -> Translator {
        Translator {
            parser: FilterParser::from_config(&self.config),
            schema: self.schema,
            config: self.config,
        }
    }
}


fn object_to_document(body: &Value) -> TranslateResult<Document> {
    match serialize_to_bson(body)? {
        Bson::Document(document) => Ok(document),
        other => Err(TranslateError::Serialization(format!(
            "expected a document, got {:?}",
            other.element_type(),
        ))),
    }
}

fn expect_object(body: &Value, what: &str) -> TranslateResult<Document> {
    match body {
        Value::Object(_) => object_to_document(body),
        other => Err(TranslateError::InvalidBody(format!(
            "{what} body must be an object, got {}",
            json_kind(other),
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
