//! Lazy result production over a snapshot of a collection.

use std::{
    borrow::Cow,
    cmp::Ordering,
    iter::FusedIterator,
    pin::Pin,
    task::{Context, Poll},
};

use bson::{Bson, DateTime, Document};
use futures::Stream;

use mongomock_core::{
    document::{Identifier, lookup},
    error::CollectionResult,
    options::{FindOptions, Sort},
};

use crate::evaluator::Matcher;

/// A one-shot, pull-based sequence of documents matching a query.
///
/// The cursor owns a snapshot of the collection taken when the query was
/// issued, already sorted if a sort was requested. Documents are matched
/// lazily on each pull, so abandoning the cursor early costs nothing. If
/// matching fails the error is yielded once and the cursor is exhausted.
///
/// `Cursor` is both an [`Iterator`] and a [`Stream`]; the stream never pends.
pub struct Cursor {
    documents: std::vec::IntoIter<Document>,
    matcher: Matcher,
    skip: usize,
    remaining: Option<usize>,
    peeked: Option<CollectionResult<Document>>,
    done: bool,
}

impl Cursor {
    pub(crate) fn new(mut snapshot: Vec<Document>, matcher: Matcher, options: &FindOptions) -> Self {
        if let Some(sort) = options.sort.as_ref().filter(|sort| !sort.is_empty()) {
            sort_documents(&mut snapshot, sort);
        }

        Self {
            documents: snapshot.into_iter(),
            matcher,
            skip: options.skip.unwrap_or(0),
            remaining: options.limit.filter(|limit| *limit > 0),
            peeked: None,
            done: false,
        }
    }

    /// Returns true if another item (a document or an error) can be pulled.
    pub fn has_next(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.advance();
        }

        self.peeked.is_some()
    }

    fn advance(&mut self) -> Option<CollectionResult<Document>> {
        if self.done || self.remaining == Some(0) {
            return None;
        }

        for document in self.documents.by_ref() {
            match self.matcher.matches(&document) {
                Ok(false) => continue,
                Ok(true) if self.skip > 0 => self.skip -= 1,
                Ok(true) => {
                    if let Some(remaining) = self.remaining.as_mut() {
                        *remaining -= 1;
                    }

                    return Some(Ok(document));
                },
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                },
            }
        }

        self.done = true;
        None
    }
}

impl Iterator for Cursor {
    type Item = CollectionResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        self.peeked
            .take()
            .or_else(|| self.advance())
    }
}

impl FusedIterator for Cursor {}

impl Stream for Cursor {
    type Item = CollectionResult<Document>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.get_mut().next())
    }
}

/// A sort key value. Non-scalars are compared by their display string.
#[derive(Debug)]
enum SortKey<'a> {
    Null,
    Int(i64),
    Number(f64),
    String(Cow<'a, str>),
    Bool(bool),
    Date(DateTime),
}

impl<'a> SortKey<'a> {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Int(_) | SortKey::Number(_) => 1,
            SortKey::String(_) => 2,
            SortKey::Bool(_) => 3,
            SortKey::Date(_) => 4,
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Null, SortKey::Null) => Ordering::Equal,
            (SortKey::Int(a), SortKey::Int(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Int(a), SortKey::Number(b)) => (*a as f64).total_cmp(b),
            (SortKey::Number(a), SortKey::Int(b)) => a.total_cmp(&(*b as f64)),
            (SortKey::String(a), SortKey::String(b)) => a.cmp(b),
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl<'a> From<Option<&'a Bson>> for SortKey<'a> {
    fn from(value: Option<&'a Bson>) -> Self {
        match value {
            None | Some(Bson::Null) => SortKey::Null,
            Some(Bson::Int32(value)) => SortKey::Int(i64::from(*value)),
            Some(Bson::Int64(value)) => SortKey::Int(*value),
            Some(Bson::Double(value)) => SortKey::Number(*value),
            Some(Bson::String(value)) => SortKey::String(Cow::Borrowed(value.as_str())),
            Some(Bson::Boolean(value)) => SortKey::Bool(*value),
            Some(Bson::DateTime(value)) => SortKey::Date(*value),
            Some(other) => SortKey::String(Cow::Owned(
                Identifier::canonical_of(other).unwrap_or_else(|| other.to_string())
            )),
        }
    }
}

/// Stably sorts documents by a multi-key sort specification.
pub(crate) fn sort_documents(documents: &mut [Document], sort: &Sort) {
    documents.sort_by(|a, b| {
        sort.keys()
            .iter()
            .map(|(field, direction)| {
                let left = SortKey::from(lookup(a, field));
                let right = SortKey::from(lookup(b, field));

                direction.apply(left.cmp(&right))
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}
