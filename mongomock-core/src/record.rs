//! Bookkeeping records kept by a collection for later inspection.
//!
//! Neither record type influences query results. They exist so tests can
//! assert on which queries were issued and which indexes were requested.

use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{filter::Filter, options::{FindOptions, IndexOptions}};

/// A `find` or `find_one` call as it was issued.
#[derive(Debug, Clone)]
pub struct QueryRecord {
    pub filter: Filter,
    pub options: FindOptions,
    pub issued_at: DateTime<Utc>,
}

impl QueryRecord {
    pub fn new(filter: Filter, options: FindOptions) -> Self {
        Self { filter, options, issued_at: Utc::now() }
    }
}

/// A descriptive index entry created by `create_index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexModel {
    pub name: String,
    pub keys: Document,
    pub options: IndexOptions,
    pub created_at: DateTime<Utc>,
}

impl IndexModel {
    /// Builds an index entry, deriving the name from the keys unless one is given.
    pub fn new(keys: Document, options: IndexOptions) -> Self {
        let name = options
            .name
            .clone()
            .unwrap_or_else(|| Self::default_name(&keys));

        Self { name, keys, options, created_at: Utc::now() }
    }

    /// Derives the conventional index name, e.g. `{ a: 1, b: -1 }` becomes `a_1_b_-1`.
    pub fn default_name(keys: &Document) -> String {
        keys.iter()
            .map(|(field, spec)| match spec {
                Bson::String(kind) => format!("{field}_{kind}"),
                other => format!("{field}_{other}"),
            })
            .collect::<Vec<_>>()
            .join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_default_index_names() {
        assert_eq!(IndexModel::default_name(&doc! { "a": 1, "b": -1 }), "a_1_b_-1");
        assert_eq!(IndexModel::default_name(&doc! { "body": "text" }), "body_text");
    }

    #[test]
    fn test_explicit_index_name_wins() {
        let options = IndexOptions { name: Some("by_email".into()), unique: Some(true), sparse: None };
        let index = IndexModel::new(doc! { "email": 1 }, options);

        assert_eq!(index.name, "by_email");
        assert_eq!(index.options.unique, Some(true));
    }
}
