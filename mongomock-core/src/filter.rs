//! Filter construction and the constraint visitor seam.
//!
//! A [`Filter`] maps field names to [`Constraint`]s. Each constraint is one of
//! a literal value, an operator set, an identifier, a caller-supplied
//! predicate, or an [`Evaluate`] implementation. The kind is fixed when the
//! filter is built so compilers dispatch on it once per field.
//!
//! # Example
//!
//! ```ignore
//! use mongomock::prelude::*;
//! use bson::doc;
//!
//! // From a document, the way a driver call would look
//! let filter = Filter::from(doc! { "status": "active", "age": { "$lt": 30 } });
//!
//! // Or field by field, mixing in a predicate
//! let filter = Filter::new()
//!     .field("status", "active")
//!     .constraint("age", Constraint::predicate(|age| age.as_i32().is_some_and(|age| age % 2 == 0)));
//! ```

use std::{fmt, sync::Arc};

use bson::{Bson, Document};

use crate::{
    document::Identifier,
    error::{CollectionError, CollectionResult},
};

/// A comparator object that decides whether a single field value matches.
///
/// Any assertion helper can implement this to be used directly as a constraint.
pub trait Evaluate: Send + Sync {
    fn evaluate(&self, value: &Bson) -> bool;
}

/// Signature of caller-supplied predicates. Missing fields are passed as `Bson::Null`.
pub type PredicateFn = dyn Fn(&Bson) -> CollectionResult<bool> + Send + Sync;

/// The recognized query operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Nin,
    /// Runtime type test, e.g. `{ "$instanceOf": "string" }`.
    InstanceOf,
}

impl Operator {
    /// Parses an operator token, returning `None` for tokens that are not recognized.
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "$eq" => Operator::Eq,
            "$ne" => Operator::Ne,
            "$lt" => Operator::Lt,
            "$lte" => Operator::Lte,
            "$gt" => Operator::Gt,
            "$gte" => Operator::Gte,
            "$in" => Operator::In,
            "$nin" => Operator::Nin,
            "$instanceOf" => Operator::InstanceOf,
            _ => return None,
        })
    }

    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::InstanceOf => "$instanceOf",
        }
    }
}

/// A single field's constraint.
#[derive(Clone)]
pub enum Constraint {
    /// Equality with a literal value.
    Literal(Bson),
    /// A mapping from operator tokens to operands, conjoined in order.
    Operators(Document),
    /// Equality by canonical identifier string.
    Identifier(Identifier),
    /// A caller-supplied predicate, used as-is.
    Predicate(Arc<PredicateFn>),
    /// A comparator object.
    Evaluator(Arc<dyn Evaluate>),
}

impl Constraint {
    /// Wraps an infallible predicate.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Bson) -> bool + Send + Sync + 'static,
    {
        Constraint::Predicate(Arc::new(move |value| Ok(predicate(value))))
    }

    /// Wraps a fallible predicate. Its errors abort the scan that invoked it.
    pub fn try_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Bson) -> CollectionResult<bool> + Send + Sync + 'static,
    {
        Constraint::Predicate(Arc::new(predicate))
    }

    /// Wraps a comparator object.
    pub fn evaluator(evaluator: impl Evaluate + 'static) -> Self {
        Constraint::Evaluator(Arc::new(evaluator))
    }
}

/// Returns true if a nested document should be read as an operator set
/// rather than a literal: it is empty or its first key is a `$` token.
pub fn is_operator_document(document: &Document) -> bool {
    document
        .keys()
        .next()
        .is_none_or(|key| key.starts_with('$'))
}

impl From<Bson> for Constraint {
    fn from(value: Bson) -> Self {
        match value {
            Bson::ObjectId(oid) => Constraint::Identifier(Identifier::ObjectId(oid)),
            Bson::Document(document) if is_operator_document(&document) => Constraint::Operators(document),
            other => Constraint::Literal(other),
        }
    }
}

impl From<Identifier> for Constraint {
    fn from(id: Identifier) -> Self {
        Constraint::Identifier(id)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Constraint::Operators(operators) => f.debug_tuple("Operators").field(operators).finish(),
            Constraint::Identifier(id) => f.debug_tuple("Identifier").field(id).finish(),
            Constraint::Predicate(_) => f.write_str("Predicate(..)"),
            Constraint::Evaluator(_) => f.write_str("Evaluator(..)"),
        }
    }
}

/// An ordered mapping from field name to [`Constraint`].
///
/// The empty filter matches every document.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    fields: Vec<(String, Constraint)>,
}

impl Filter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field constraint from a plain value, classified like a document filter would be.
    pub fn field(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.constraint(field, Constraint::from(value.into()))
    }

    /// Adds an explicit constraint, replacing any earlier constraint on the same field.
    pub fn constraint(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        let field = field.into();

        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, existing)) => *existing = constraint,
            None => self.fields.push((field, constraint)),
        }

        self
    }

    /// Returns the constraint on `field`, if any.
    pub fn get(&self, field: &str) -> Option<&Constraint> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, constraint)| constraint)
    }

    /// Iterates over the constraints in filter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.fields
            .iter()
            .map(|(name, constraint)| (name.as_str(), constraint))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Document> for Filter {
    fn from(document: Document) -> Self {
        document
            .into_iter()
            .map(|(field, value)| (field, Constraint::from(value)))
            .collect()
    }
}

impl From<&Document> for Filter {
    fn from(document: &Document) -> Self {
        Filter::from(document.clone())
    }
}

impl FromIterator<(String, Constraint)> for Filter {
    fn from_iter<I: IntoIterator<Item = (String, Constraint)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Filter::new(), |filter, (field, constraint)| filter.constraint(field, constraint))
    }
}

/// Visitor over the constraint variants.
///
/// Compilers implement this to turn a [`Constraint`] into an executable form;
/// [`ConstraintVisitor::visit_constraint`] does the dispatch.
pub trait ConstraintVisitor {
    type Output;
    type Error: Into<CollectionError>;

    fn visit_literal(&mut self, value: &Bson) -> Result<Self::Output, Self::Error>;
    fn visit_operators(&mut self, operators: &Document) -> Result<Self::Output, Self::Error>;
    fn visit_identifier(&mut self, id: &Identifier) -> Result<Self::Output, Self::Error>;
    fn visit_predicate(&mut self, predicate: &Arc<PredicateFn>) -> Result<Self::Output, Self::Error>;
    fn visit_evaluator(&mut self, evaluator: &Arc<dyn Evaluate>) -> Result<Self::Output, Self::Error>;

    fn visit_constraint(&mut self, constraint: &Constraint) -> Result<Self::Output, Self::Error> {
        match constraint {
            Constraint::Literal(value) => self.visit_literal(value),
            Constraint::Operators(operators) => self.visit_operators(operators),
            Constraint::Identifier(id) => self.visit_identifier(id),
            Constraint::Predicate(predicate) => self.visit_predicate(predicate),
            Constraint::Evaluator(evaluator) => self.visit_evaluator(evaluator),
        }
    }
}
