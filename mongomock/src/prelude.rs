//! Convenient re-exports of commonly used types from mongomock.
//!
//! ```ignore
//! use mongomock::prelude::*;
//! ```

pub use mongomock_core::{
    collection::DocumentCollection,
    document::{Identifier, ValueKind, ID_FIELD},
    error::{CollectionError, CollectionResult},
    filter::{Constraint, ConstraintVisitor, Evaluate, Filter, Operator},
    options::{CountOptions, FindOptions, FindOptionsBuilder, IndexOptions, Sort, SortDirection},
    record::{IndexModel, QueryRecord},
    results::{CreateIndexResult, DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};
pub use mongomock_memory::{Cursor, Matcher, MockCollection, MockCollectionBuilder};
