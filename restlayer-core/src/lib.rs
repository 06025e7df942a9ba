//! Query condition translation for auto-generated REST endpoints over document collections.
//!
//! This crate is the core of the restlayer project and turns loosely-typed, wire-level
//! filter expressions into typed, structurally valid filters for a document store:
//!
//! - **Schemas** ([`schema`]) - Per-collection field type descriptors
//! - **Type coercion** ([`coerce`]) - Raw query-string values to typed values
//! - **Filter parsing** ([`filter`]) - Flat `field$op=value` parameters to filter trees, and
//!   rendering of those trees as BSON
//! - **Identifier resolution** ([`identifier`]) - Rewriting identifier-looking clauses so they
//!   match both the string and the native form
//! - **Translation** ([`translate`]) - Per-collection composition of the steps above for each
//!   endpoint
//! - **Configuration** ([`config`]) - Delimiters and literals used while parsing
//! - **Error handling** ([`error`]) - Error and result types
//!
//! Everything here is a pure, synchronous transformation over values owned by the caller,
//! so a [`translate::Translator`] can be shared freely between request handlers.
//!
//! # Example
//!
//! ```ignore
//! use restlayer_core::{
//!     schema::{FieldType, SchemaDescriptor},
//!     translate::Translator,
//! };
//!
//! let schema = SchemaDescriptor::from_iter([
//!     ("name", FieldType::String),
//!     ("age", FieldType::Number),
//!     ("owner", FieldType::Identifier),
//! ]);
//! let translator = Translator::new(schema);
//!
//! // GET /cats?age$gte=2&owner=507f1f77bcf86cd799439011
//! let filter = translator.query_filter([
//!     ("age$gte", "2"),
//!     ("owner", "507f1f77bcf86cd799439011"),
//! ]);
//! ```

pub mod coerce;
pub mod config;
pub mod error;
pub mod filter;
pub mod identifier;
pub mod schema;
pub mod translate;
