//! In-memory mock collection.
//!
//! This module provides [`MockCollection`], a single collection held entirely
//! in memory. Besides the documents it keeps a log of issued queries and a
//! registry of requested indexes, both of which tests can inspect afterwards.

use bson::{Bson, Document};
use serde::Serialize;

use mongomock_core::{
    collection::DocumentCollection,
    document::{ID_FIELD, Identifier, to_document, type_name},
    error::{CollectionError, CollectionResult},
    filter::Filter,
    options::{CountOptions, FindOptions, IndexOptions},
    record::{IndexModel, QueryRecord},
    results::{CreateIndexResult, DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

use crate::{cursor::Cursor, evaluator::Matcher};

const DEFAULT_NAME: &str = "mock";

/// A single in-memory document collection for use as a test fixture.
///
/// The collection is owned by one caller at a time: reads take `&self`,
/// everything that changes documents or bookkeeping takes `&mut self`.
/// `find` takes `&mut self` too because it appends to the query log.
///
/// Queries scan every document in insertion order. Indexes are recorded but
/// never consulted.
///
/// # Example
///
/// ```ignore
/// use mongomock::prelude::*;
/// use bson::doc;
///
/// let mut users = MockCollection::new("users");
/// users.insert_one(&doc! { "name": "Alice", "age": 30 })?;
///
/// let alice = users.find_one(doc! { "age": { "$lt": 40 } }, None)?;
/// assert!(alice.is_some());
/// assert_eq!(users.queries().len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct MockCollection {
    name: String,
    strict_operators: bool,
    documents: Vec<Document>,
    queries: Vec<QueryRecord>,
    indexes: Vec<IndexModel>,
    dropped: bool,
}

impl MockCollection {
    /// Creates an empty collection with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strict_operators: false,
            documents: Vec::new(),
            queries: Vec::new(),
            indexes: Vec::new(),
            dropped: false,
        }
    }

    /// Creates a builder for constructing a `MockCollection` with custom options.
    pub fn builder() -> MockCollectionBuilder {
        MockCollectionBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stored documents, in store order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Every `find` and `find_one` call issued so far, oldest first.
    pub fn queries(&self) -> &[QueryRecord] {
        &self.queries
    }

    /// Every index requested so far, oldest first.
    pub fn indexes(&self) -> &[IndexModel] {
        &self.indexes
    }

    pub fn is_dropped(&self) -> bool {
        self.dropped
    }

    /// Snapshot of the stored documents as JSON, for assertions and debugging output.
    pub fn documents_json(&self) -> CollectionResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.documents)?)
    }

    /// Clears documents, the query log and the index registry, and un-drops the collection.
    pub fn reset(&mut self) {
        self.documents.clear();
        self.queries.clear();
        self.indexes.clear();
        self.dropped = false;

        tracing::debug!(collection = %self.name, "reset collection");
    }

    fn matcher(&self, filter: &Filter) -> CollectionResult<Matcher> {
        Matcher::compile_with(filter, self.strict_operators)
    }

    /// Extracts the `$set` fields of an update document.
    ///
    /// Other operators are ignored with a warning, or rejected when strict.
    fn set_fields<'u>(&self, update: &'u Document) -> CollectionResult<Option<&'u Document>> {
        let mut set = None;

        for (operator, value) in update {
            match (operator.as_str(), value) {
                ("$set", Bson::Document(fields)) => set = Some(fields),
                ("$set", other) => {
                    return Err(CollectionError::InvalidUpdate(format!(
                        "$set expects a document, got {}",
                        type_name(other),
                    )));
                },
                _ if self.strict_operators => {
                    return Err(CollectionError::UnknownOperator(operator.clone(), "update".to_string()));
                },
                _ => tracing::warn!(
                    collection = %self.name,
                    operator = %operator,
                    "ignoring unsupported update operator"
                ),
            }
        }

        Ok(set)
    }
}

impl Default for MockCollection {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl DocumentCollection for MockCollection {
    type Cursor = Cursor;

    fn insert_one<T: Serialize + ?Sized>(&mut self, document: &T) -> CollectionResult<InsertOneResult> {
        let document = to_document(document)?;

        let (id, document) = match document.get(ID_FIELD).cloned() {
            Some(id) => (id, document),
            None => {
                let id = Bson::from(Identifier::new());
                let mut with_id = Document::new();
                with_id.insert(ID_FIELD, id.clone());

                for (field, value) in document {
                    with_id.insert(field, value);
                }

                (id, with_id)
            },
        };

        if self.documents.iter().any(|existing| existing.get(ID_FIELD) == Some(&id)) {
            return Err(CollectionError::DuplicateKey(id.to_string(), self.name.clone()));
        }

        self.documents.push(document);

        tracing::debug!(collection = %self.name, id = %id, "inserted document");

        Ok(InsertOneResult { inserted_id: id })
    }

    fn insert_many<T: Serialize>(
        &mut self,
        documents: impl IntoIterator<Item = T>,
    ) -> CollectionResult<InsertManyResult> {
        let inserted_ids = documents
            .into_iter()
            .map(|document| {
                self.insert_one(&document)
                    .map(|result| result.inserted_id)
            })
            .collect::<CollectionResult<Vec<_>>>()?;

        Ok(InsertManyResult { inserted_ids })
    }

    fn delete_many(&mut self, filter: impl Into<Filter>) -> CollectionResult<DeleteResult> {
        let matcher = self.matcher(&filter.into())?;
        let doomed = self.documents
            .iter()
            .map(|document| matcher.matches(document))
            .collect::<CollectionResult<Vec<_>>>()?;

        let before = self.documents.len();
        let mut doomed = doomed.into_iter();
        self.documents.retain(|_| !doomed.next().unwrap_or(false));

        let deleted_count = (before - self.documents.len()) as u64;

        tracing::debug!(collection = %self.name, deleted_count, "deleted documents");

        Ok(DeleteResult { deleted_count })
    }

    fn update_one(&mut self, filter: impl Into<Filter>, update: Document) -> CollectionResult<UpdateResult> {
        let matcher = self.matcher(&filter.into())?;
        let fields = self.set_fields(&update)?;

        let matched = self.documents
            .iter()
            .enumerate()
            .filter_map(|(index, document)| match matcher.matches(document) {
                Ok(true) => Some(Ok(index)),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            })
            .collect::<CollectionResult<Vec<_>>>()?;

        let mut modified_count = 0;

        if let Some(fields) = fields {
            for index in &matched {
                let document = &mut self.documents[*index];
                let mut changed = false;

                for (field, value) in fields {
                    if document.get(field) != Some(value) {
                        document.insert(field.clone(), value.clone());
                        changed = true;
                    }
                }

                if changed {
                    modified_count += 1;
                }
            }
        }

        let matched_count = matched.len() as u64;

        tracing::debug!(collection = %self.name, matched_count, modified_count, "updated documents");

        Ok(UpdateResult { matched_count, modified_count })
    }

    fn find(
        &mut self,
        filter: impl Into<Filter>,
        options: impl Into<Option<FindOptions>>,
    ) -> CollectionResult<Cursor> {
        let filter = filter.into();
        let options = options.into().unwrap_or_default();

        // Logged before compiling so failed queries are still visible.
        self.queries.push(QueryRecord::new(filter.clone(), options.clone()));

        tracing::debug!(
            collection = %self.name,
            fields = filter.len(),
            skip = ?options.skip,
            limit = ?options.limit,
            "find"
        );

        let matcher = self.matcher(&filter)?;

        Ok(Cursor::new(self.documents.clone(), matcher, &options))
    }

    fn count(
        &self,
        filter: impl Into<Filter>,
        options: impl Into<Option<CountOptions>>,
    ) -> CollectionResult<u64> {
        let options = options.into().unwrap_or_default();
        let matcher = self.matcher(&filter.into())?;

        let mut matched = 0u64;
        for document in &self.documents {
            if matcher.matches(document)? {
                matched += 1;
            }
        }

        let counted = matched.saturating_sub(options.skip.unwrap_or(0) as u64);

        Ok(match options.limit.filter(|limit| *limit > 0) {
            Some(limit) => counted.min(limit as u64),
            None => counted,
        })
    }

    fn create_index(
        &mut self,
        keys: Document,
        options: impl Into<Option<IndexOptions>>,
    ) -> CollectionResult<CreateIndexResult> {
        if keys.is_empty() {
            return Err(CollectionError::InvalidOptions("index key specification is empty".to_string()));
        }

        let index = IndexModel::new(keys, options.into().unwrap_or_default());
        let index_name = index.name.clone();
        self.indexes.push(index);

        tracing::debug!(collection = %self.name, index = %index_name, "created index");

        Ok(CreateIndexResult { index_name })
    }

    fn drop(&mut self) -> CollectionResult<()> {
        self.documents.clear();
        self.dropped = true;

        tracing::debug!(collection = %self.name, "dropped collection");

        Ok(())
    }
}

/// Builder for constructing [`MockCollection`] instances.
///
/// # Example
///
/// ```ignore
/// use mongomock_memory::MockCollection;
/// use bson::doc;
///
/// let users = MockCollection::builder()
///     .name("users")
///     .strict_operators(true)
///     .document(doc! { "name": "Alice" })
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct MockCollectionBuilder {
    name: Option<String>,
    strict_operators: bool,
    documents: Vec<Document>,
}

impl MockCollectionBuilder {
    /// Sets the collection name. Defaults to `"mock"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Rejects unrecognized query and update operators instead of ignoring them.
    pub fn strict_operators(mut self, strict: bool) -> Self {
        self.strict_operators = strict;
        self
    }

    /// Adds a seed document, inserted when the collection is built.
    pub fn document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }

    /// Adds several seed documents.
    pub fn documents(mut self, documents: impl IntoIterator<Item = Document>) -> Self {
        self.documents.extend(documents);
        self
    }

    /// Builds the collection and inserts the seed documents in order.
    ///
    /// # Errors
    ///
    /// Fails if two seed documents share an `_id`.
    pub fn build(self) -> CollectionResult<MockCollection> {
        let mut collection = MockCollection::new(self.name.unwrap_or_else(|| DEFAULT_NAME.to_string()));
        collection.strict_operators = self.strict_operators;
        collection.insert_many(self.documents)?;

        Ok(collection)
    }
}
