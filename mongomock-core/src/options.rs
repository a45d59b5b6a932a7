//! Options for find, count and index operations.
//!
//! Find options are built with the fluent [`FindOptionsBuilder`]:
//!
//! ```ignore
//! use mongomock::options::{FindOptions, SortDirection};
//!
//! let options = FindOptions::builder()
//!     .sort("a", SortDirection::Asc)
//!     .sort("b", SortDirection::Desc)
//!     .skip(1)
//!     .build();
//! ```

use std::cmp::Ordering;

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use crate::error::{CollectionError, CollectionResult};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order, written `1` in a sort document.
    Asc,
    /// Descending order, written `-1` in a sort document.
    Desc,
}

impl SortDirection {
    /// Orients an ascending comparison result for this direction.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl TryFrom<&Bson> for SortDirection {
    type Error = CollectionError;

    fn try_from(value: &Bson) -> Result<Self, Self::Error> {
        let direction = match value {
            Bson::Int32(value) => *value as f64,
            Bson::Int64(value) => *value as f64,
            Bson::Double(value) => *value,
            other => return Err(CollectionError::InvalidOptions(format!("invalid sort direction {other}"))),
        };

        if direction > 0.0 {
            Ok(SortDirection::Asc)
        } else if direction < 0.0 {
            Ok(SortDirection::Desc)
        } else {
            Err(CollectionError::InvalidOptions(format!("invalid sort direction {value}")))
        }
    }
}

/// An ordered, multi-key sort specification.
///
/// Keys are consulted left to right; later keys only break ties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    keys: Vec<(String, SortDirection)>,
}

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sort key.
    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.keys.push((field.into(), direction));
        self
    }

    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl TryFrom<Document> for Sort {
    type Error = CollectionError;

    /// Parses a sort document such as `{ "a": 1, "b": -1 }`.
    fn try_from(document: Document) -> Result<Self, Self::Error> {
        document
            .iter()
            .try_fold(Sort::new(), |sort, (field, direction)| {
                Ok(sort.then(field.as_str(), SortDirection::try_from(direction)?))
            })
    }
}

/// Options accepted by `find` and `find_one`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    /// Number of matches to skip before yielding.
    pub skip: Option<usize>,
    /// Maximum number of matches to yield. `0` means no limit.
    pub limit: Option<usize>,
    /// Sort specification applied to the snapshot before filtering.
    pub sort: Option<Sort>,
}

impl FindOptions {
    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOptionsBuilder {
    options: FindOptions,
}

impl FindOptionsBuilder {
    /// Sets the number of matches to skip.
    pub fn skip(mut self, skip: usize) -> Self {
        self.options.skip = Some(skip);
        self
    }

    /// Sets the maximum number of matches to yield.
    pub fn limit(mut self, limit: usize) -> Self {
        self.options.limit = Some(limit);
        self
    }

    /// Appends a sort key to the sort specification.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        let sort = self.options.sort.take().unwrap_or_default();
        self.options.sort = Some(sort.then(field, direction));
        self
    }

    /// Replaces the whole sort specification.
    pub fn sort_by(mut self, sort: Sort) -> Self {
        self.options.sort = Some(sort);
        self
    }

    pub fn build(self) -> FindOptions {
        self.options
    }
}

/// Options accepted by `count`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountOptions {
    pub skip: Option<usize>,
    /// `0` means no limit.
    pub limit: Option<usize>,
}

/// Descriptive options recorded with an index. None of them affect queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Explicit index name; derived from the key specification when absent.
    pub name: Option<String>,
    pub unique: Option<bool>,
    pub sparse: Option<bool>,
}
