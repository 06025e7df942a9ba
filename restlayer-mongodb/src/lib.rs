//! MongoDB adapter for restlayer.
//!
//! This crate hands the filters and pipelines produced by `restlayer-core` to the
//! MongoDB driver, giving each collection the operations of an auto-generated REST
//! endpoint: find by query parameters, search by JSON body, aggregate, create, delete
//! and update. Transport (HTTP routing, response envelopes) is left to the caller.
//!
//! To use this adapter, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! restlayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use restlayer::{mongodb::MongoEndpoint, schema::{FieldType, SchemaDescriptor}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = mongodb::Client::with_uri_str("mongodb://localhost:27017").await?;
//!     let cats = MongoEndpoint::for_collection(
//!         &client.database("cats"),
//!         "cats",
//!         SchemaDescriptor::from_iter([("name", FieldType::String), ("age", FieldType::Number)]),
//!     );
//!
//!     // GET /cat?age$gte=2
//!     let docs = cats.find([("age$gte", "2")]).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod endpoint;

pub use endpoint::MongoEndpoint;
