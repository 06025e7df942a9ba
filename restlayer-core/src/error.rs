//! Error types and result types for query translation.
//!
//! Coercion and flat-parameter parsing never fail: malformed values become sentinel
//! values and ambiguous keys are skipped. Errors only surface when a request body has
//! the wrong shape for its endpoint, when a body cannot be converted to BSON, or when
//! the store driver reports a failure.
//! Use [`TranslateResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur while translating or executing a request.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// Serialization error when converting between request formats (JSON, BSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The request body does not have the shape the endpoint expects
    /// (for example, a search body that is not an object).
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    /// An error occurred in the underlying store driver.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for translation operations.
pub type TranslateResult<T> = Result<T, TranslateError>;

impl From<BsonError> for TranslateError {
    fn from(err: BsonError) -> Self {
        TranslateError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for TranslateError {
    fn from(err: SerdeJsonError) -> Self {
        TranslateError::Serialization(err.to_string())
    }
}
