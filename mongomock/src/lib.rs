//! In-memory mock of a MongoDB-style document collection.
//!
//! This crate is the primary entry point of the mongomock project. It lets
//! application code under test insert, query, update, delete and index
//! documents without a live database, and keeps enough bookkeeping around for
//! the test to assert on what the code did.
//!
//! # Features
//!
//! - **Realistic filters** - Literal equality, dotted paths, `$lt`/`$lte`/`$instanceOf` and friends, caller predicates
//! - **Lazy cursors** - Sorted, skipped and limited results produced from a snapshot
//! - **Inspection** - Query log, index registry and dropped flag readable after the fact
//!
//! # Quick Start
//!
//! ```ignore
//! use mongomock::prelude::*;
//! use bson::doc;
//!
//! fn main() -> CollectionResult<()> {
//!     let mut users = MockCollection::new("users");
//!
//!     users.insert_many(vec![
//!         doc! { "name": "Alice", "age": 30 },
//!         doc! { "name": "Bob", "age": 41 },
//!     ])?;
//!
//!     let oldest = users.find_one(
//!         doc! {},
//!         FindOptions::builder().sort("age", SortDirection::Desc).build(),
//!     )?;
//!     println!("Oldest user: {:?}", oldest);
//!
//!     users.update_one(doc! { "name": "Alice" }, doc! { "$set": { "age": 31 } })?;
//!     assert_eq!(users.count(doc! { "age": { "$lt": 40 } }, None)?, 1);
//!
//!     // Every find is logged for later assertions
//!     assert_eq!(users.queries().len(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Predicates
//!
//! Constraints that cannot be expressed as operators can be written as closures
//! or as [`filter::Evaluate`] implementations:
//!
//! ```ignore
//! use mongomock::prelude::*;
//!
//! let filter = Filter::new()
//!     .field("status", "active")
//!     .constraint("email", Constraint::predicate(|email| {
//!         email.as_str().is_some_and(|email| email.ends_with("@example.com"))
//!     }));
//!
//! let matches = users.find(filter, None)?.count();
//! ```

pub mod prelude;

pub use mongomock_core::{collection, document, error, filter, options, record, results};

// Re-export BSON types for convenience
pub use bson;

/// In-memory collection engine.
pub mod memory {
    pub use mongomock_memory::{Cursor, Matcher, MockCollection, MockCollectionBuilder};
}
