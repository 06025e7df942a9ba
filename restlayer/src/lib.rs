//! Main restlayer crate providing query condition translation for auto-generated REST
//! endpoints over document collections.
//!
//! This crate is the primary entry point for users of restlayer. It re-exports the
//! translation engine from `restlayer-core` and, behind the `mongodb` feature, the
//! MongoDB adapter.
//!
//! # Features
//!
//! - **Schema-driven coercion** - Raw query-string values become numbers, dates, booleans or lists
//! - **Flat filter parsing** - `age$gte=10&age$lt=20` becomes one typed range on `age`
//! - **Identifier resolution** - Identifier strings match both their string and native forms
//! - **Body translation** - Search objects and aggregation pipelines go straight to the store
//!
//! # Quick Start
//!
//! ```ignore
//! use restlayer::prelude::*;
//!
//! let cats = Translator::new(SchemaDescriptor::from_iter([
//!     ("name", FieldType::String),
//!     ("age", FieldType::Number),
//!     ("birth", FieldType::Date),
//! ]));
//!
//! // GET /cat?age$gte=2&age$lt=10&name=Tom,Felix
//! let filter = cats.query_filter([("age$gte", "2"), ("age$lt", "10"), ("name", "Tom,Felix")]);
//!
//! // POST /cat/search
//! let filter = cats.search_filter(serde_json::json!({ "owner": "507f1f77bcf86cd799439011" }))?;
//!
//! // POST /cat/aggregate
//! let pipeline = cats.aggregate_pipeline(serde_json::json!([
//!     { "$match": { "age": { "$gte": 2 } } },
//!     { "$group": { "_id": "$name", "count": { "$sum": 1 } } },
//! ]))?;
//! ```
//!
//! # Backends
//!
//! - [`mongodb`] - MongoDB endpoint operations (requires `mongodb` feature)

pub mod prelude;

pub use restlayer_core::{coerce, config, error, filter, identifier, schema, translate};

// Re-export BSON and JSON types for convenience
pub use bson;
pub use serde_json;

/// MongoDB endpoint operations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use restlayer_mongodb::MongoEndpoint;
}
