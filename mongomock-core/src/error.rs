//! Error types and result types for mock collection operations.
//!
//! Use [`CollectionResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by a mock collection.
///
/// Filters, updates and options are validated when they are compiled, so most
/// of these surface before any document is scanned. The exceptions are
/// [`CollectionError::Incomparable`] and [`CollectionError::Predicate`],
/// which depend on the values being scanned.
#[derive(Error, Debug)]
pub enum CollectionError {
    /// Serialization/deserialization error when normalizing documents.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The input could not be stored as a document.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A document with the given `_id` already exists.
    /// The first argument is the identifier, the second is the collection name.
    #[error("Duplicate key {0} in collection {1}")]
    DuplicateKey(String, String),
    /// An unrecognized `$` operator was rejected by a strict collection.
    /// The first argument is the operator, the second is the field or update it appeared in.
    #[error("Unknown operator {0} in {1}")]
    UnknownOperator(String, String),
    /// An operator was given an operand it cannot use.
    #[error("Invalid operand for {0}: {1}")]
    InvalidOperand(String, String),
    /// Two values of incompatible types were ordered against each other.
    #[error("Cannot compare {0} with {1}")]
    Incomparable(String, String),
    /// Find, count or index options were malformed.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    /// The update document was malformed.
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
    /// A caller-supplied predicate failed.
    #[error("Predicate error: {0}")]
    Predicate(String),
}

/// A specialized `Result` type for mock collection operations.
pub type CollectionResult<T> = Result<T, CollectionError>;

impl From<BsonError> for CollectionError {
    fn from(err: BsonError) -> Self {
        CollectionError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for CollectionError {
    fn from(err: SerdeJsonError) -> Self {
        CollectionError::Serialization(err.to_string())
    }
}
