//! The driver-compatible collection interface.
//!
//! Application code written against [`DocumentCollection`] can be handed a
//! mock collection in tests. All operations are synchronous and run to
//! completion before returning; only the cursor returned by `find` is lazy.
//!
//! # Example
//!
//! ```ignore
//! use mongomock::prelude::*;
//! use bson::doc;
//!
//! fn deactivate<C: DocumentCollection>(users: &mut C, name: &str) -> CollectionResult<u64> {
//!     let result = users.update_one(doc! { "name": name }, doc! { "$set": { "active": false } })?;
//!     Ok(result.matched_count)
//! }
//! ```

use bson::Document;
use serde::Serialize;

use crate::{
    error::CollectionResult,
    filter::Filter,
    options::{CountOptions, FindOptions, IndexOptions},
    results::{CreateIndexResult, DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

/// Abstract interface of a document collection.
pub trait DocumentCollection {
    /// Lazy, single-pass sequence of matching documents.
    type Cursor: Iterator<Item = CollectionResult<Document>>;

    /// Inserts a single document, assigning a fresh `_id` if it has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not document-shaped or its `_id` is already taken.
    fn insert_one<T: Serialize + ?Sized>(&mut self, document: &T) -> CollectionResult<InsertOneResult>;

    /// Inserts documents one by one. Not atomic: on failure, earlier documents stay inserted.
    fn insert_many<T: Serialize>(
        &mut self,
        documents: impl IntoIterator<Item = T>,
    ) -> CollectionResult<InsertManyResult>;

    /// Removes every document matching `filter`, keeping the survivors in order.
    fn delete_many(&mut self, filter: impl Into<Filter>) -> CollectionResult<DeleteResult>;

    /// Applies the `$set` fields of `update` to the matching documents.
    ///
    /// Despite the name this updates every matching document, not only the first.
    fn update_one(&mut self, filter: impl Into<Filter>, update: Document) -> CollectionResult<UpdateResult>;

    /// Records the query and returns a cursor over the matching documents.
    fn find(
        &mut self,
        filter: impl Into<Filter>,
        options: impl Into<Option<FindOptions>>,
    ) -> CollectionResult<Self::Cursor>;

    /// Returns the first document `find` would yield.
    fn find_one(
        &mut self,
        filter: impl Into<Filter>,
        options: impl Into<Option<FindOptions>>,
    ) -> CollectionResult<Option<Document>> {
        self.find(filter, options)?
            .next()
            .transpose()
    }

    /// Counts the documents matching `filter`. Not recorded in the query log.
    fn count(
        &self,
        filter: impl Into<Filter>,
        options: impl Into<Option<CountOptions>>,
    ) -> CollectionResult<u64>;

    /// Records an index descriptor.
    fn create_index(
        &mut self,
        keys: Document,
        options: impl Into<Option<IndexOptions>>,
    ) -> CollectionResult<CreateIndexResult>;

    /// Removes all documents and marks the collection as dropped.
    fn drop(&mut self) -> CollectionResult<()>;
}
