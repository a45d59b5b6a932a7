//! Data model and interface of an in-memory mock document collection.
//!
//! This crate is the core of the mongomock project and provides:
//!
//! - **Collection interface** ([`collection`]) - The driver-style operation surface
//! - **Filters** ([`filter`]) - Field constraints and the visitor used to compile them
//! - **Options** ([`options`]) - Find, count, sort and index options
//! - **Documents** ([`document`]) - Normalization, identifiers and dotted-path lookup
//! - **Records** ([`record`]) - Query log and index registry entries
//! - **Results** ([`results`]) - Values returned by mutations
//! - **Error handling** ([`error`]) - Error and result types
//!
//! The engine that evaluates filters lives in `mongomock-memory`.

#[allow(unused_extern_crates)]
extern crate self as mongomock_core;

pub mod collection;
pub mod document;
pub mod error;
pub mod filter;
pub mod options;
pub mod record;
pub mod results;
