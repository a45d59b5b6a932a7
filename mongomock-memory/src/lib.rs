//! In-memory collection engine for mongomock.
//!
//! This crate provides [`MockCollection`], an implementation of
//! `DocumentCollection` that keeps its documents in a `Vec` and evaluates
//! filters itself. It is meant to stand in for a live database collection in
//! tests.
//!
//! # Features
//!
//! - **Filter compilation** - Filters are compiled once into a [`Matcher`] and reused per document
//! - **Lazy cursors** - Results are produced on demand from a snapshot, with sort, skip and limit
//! - **Inspection** - Issued queries, created indexes and the dropped flag stay readable
//!
//! # Quick Start
//!
//! ```ignore
//! use mongomock_core::collection::DocumentCollection;
//! use mongomock_memory::MockCollection;
//! use bson::doc;
//!
//! let mut users = MockCollection::new("users");
//! users.insert_many(vec![doc! { "name": "Alice", "age": 30 }, doc! { "name": "Bob", "age": 41 }])?;
//!
//! let young = users
//!     .find(doc! { "age": { "$lt": 40 } }, None)?
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! assert_eq!(young.len(), 1);
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongomock_memory;

pub mod cursor;
pub mod evaluator;
pub mod store;

pub use cursor::Cursor;
pub use evaluator::Matcher;
pub use store::{MockCollection, MockCollectionBuilder};
