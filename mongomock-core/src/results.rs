//! Result values returned by collection operations.

use bson::Bson;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertOneResult {
    /// The `_id` of the inserted document, generated when the input had none.
    pub inserted_id: Bson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertManyResult {
    /// The `_id`s of the inserted documents, in input order.
    pub inserted_ids: Vec<Bson>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub matched_count: u64,
    /// Matched documents whose contents actually changed.
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIndexResult {
    pub index_name: String,
}
