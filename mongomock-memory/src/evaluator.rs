//! Filter compilation and evaluation for in-memory documents.
//!
//! A [`Filter`] is compiled once into a [`Matcher`]: every field constraint is
//! turned into a [`FieldMatcher`] by [`ConstraintCompiler`], which decides the
//! constraint's kind up front. The matcher is then applied to as many
//! documents as needed.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use bson::{Binary, Bson, DateTime, Document, oid::ObjectId, spec::BinarySubtype};

use mongomock_core::{
    document::{Identifier, ValueKind, lookup, type_name},
    error::{CollectionError, CollectionResult},
    filter::{ConstraintVisitor, Evaluate, Filter, Operator, PredicateFn},
};

/// Value fed to constraints for fields a document does not have.
static MISSING: Bson = Bson::Null;

/// Type-erased, comparable representation of BSON values.
///
/// Integers compare exactly as i64 and against floats as f64, so `1`, `1i64`
/// and `1.0` compare equal. Values without a natural ordering only support
/// equality.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    ObjectId(ObjectId),
    Binary(&'a [u8]),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
    /// Any other BSON type, compared with BSON equality.
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Binary(binary) => Comparable::Binary(&binary.bytes),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::Int(a), Comparable::Number(b))
            | (Comparable::Number(b), Comparable::Int(a)) => *a as f64 == *b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Binary(a), Comparable::Binary(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Number(b)) => (*a as f64).partial_cmp(b),
            (Comparable::Number(a), Comparable::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.bytes().partial_cmp(&b.bytes()),
            _ => None,
        }
    }
}

/// Orders a field value against an operand.
///
/// Returns `Ok(None)` when either side is null (a missing field never
/// satisfies an ordering) or for NaN, and an error for incompatible types.
pub(crate) fn order(value: &Bson, operand: &Bson) -> CollectionResult<Option<Ordering>> {
    if matches!(value, Bson::Null) || matches!(operand, Bson::Null) {
        return Ok(None);
    }

    let left = Comparable::from(value);
    let right = Comparable::from(operand);

    match left.partial_cmp(&right) {
        Some(ordering) => Ok(Some(ordering)),
        None => match (&left, &right) {
            (Comparable::Int(_) | Comparable::Number(_), Comparable::Int(_) | Comparable::Number(_)) => Ok(None),
            _ => Err(CollectionError::Incomparable(
                type_name(value).to_string(),
                type_name(operand).to_string(),
            )),
        },
    }
}

/// Literal equality.
///
/// Identifiers (ObjectIds and UUID binaries) match their canonical string form
/// on either side. Other binary values match strings with the same raw
/// content. Everything else compares structurally.
pub(crate) fn literal_eq(value: &Bson, constraint: &Bson) -> bool {
    match (value, constraint) {
        (Bson::ObjectId(_) | Bson::Binary(Binary { subtype: BinarySubtype::Uuid, .. }), Bson::String(_))
        | (Bson::String(_), Bson::ObjectId(_) | Bson::Binary(Binary { subtype: BinarySubtype::Uuid, .. }))
            if Identifier::canonical_of(value) == Identifier::canonical_of(constraint) => true,
        (Bson::Binary(binary), Bson::String(expected)) => binary.bytes == expected.as_bytes(),
        _ => Comparable::from(value) == Comparable::from(constraint),
    }
}

/// The ordering operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bound {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Bound {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Bound::Lt => ordering.is_lt(),
            Bound::Lte => ordering.is_le(),
            Bound::Gt => ordering.is_gt(),
            Bound::Gte => ordering.is_ge(),
        }
    }
}

/// One compiled entry of an operator set.
#[derive(Debug, Clone)]
pub(crate) enum OperatorTest {
    Eq(Bson),
    Ne(Bson),
    Order(Bound, Bson),
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    InstanceOf(ValueKind),
}

impl OperatorTest {
    fn evaluate(&self, value: &Bson) -> CollectionResult<bool> {
        Ok(match self {
            OperatorTest::Eq(operand) => literal_eq(value, operand),
            OperatorTest::Ne(operand) => !literal_eq(value, operand),
            OperatorTest::Order(bound, operand) => order(value, operand)?
                .is_some_and(|ordering| bound.accepts(ordering)),
            OperatorTest::In(operands) => operands
                .iter()
                .any(|operand| literal_eq(value, operand)),
            OperatorTest::Nin(operands) => !operands
                .iter()
                .any(|operand| literal_eq(value, operand)),
            OperatorTest::InstanceOf(kind) => kind.matches(value),
        })
    }
}

/// A compiled single-field constraint.
pub(crate) enum FieldMatcher {
    Literal(Bson),
    /// Conjunction of operator tests, in operator-set order. Empty means no constraint.
    Operators(Vec<OperatorTest>),
    /// Canonical identifier string to compare against.
    Identifier(String),
    Predicate(Arc<PredicateFn>),
    Evaluator(Arc<dyn Evaluate>),
}

impl FieldMatcher {
    pub(crate) fn matches(&self, value: &Bson) -> CollectionResult<bool> {
        match self {
            FieldMatcher::Literal(expected) => Ok(literal_eq(value, expected)),
            FieldMatcher::Operators(tests) => {
                for test in tests {
                    if !test.evaluate(value)? {
                        return Ok(false);
                    }
                }

                Ok(true)
            },
            FieldMatcher::Identifier(expected) => Ok(
                Identifier::canonical_of(value)
                    .is_some_and(|canonical| canonical == *expected)
            ),
            FieldMatcher::Predicate(predicate) => predicate(value),
            FieldMatcher::Evaluator(evaluator) => Ok(evaluator.evaluate(value)),
        }
    }
}

/// Compiles the constraint of one field.
pub(crate) struct ConstraintCompiler<'a> {
    field: &'a str,
    strict: bool,
}

impl<'a> ConstraintCompiler<'a> {
    pub fn new(field: &'a str, strict: bool) -> Self {
        Self { field, strict }
    }

    fn compile_operator(&self, operator: Operator, operand: &Bson) -> CollectionResult<OperatorTest> {
        let array_operand = || match operand {
            Bson::Array(items) => Ok(items.clone()),
            other => Err(CollectionError::InvalidOperand(
                operator.token().to_string(),
                format!("expected an array, got {}", type_name(other)),
            )),
        };

        Ok(match operator {
            Operator::Eq => OperatorTest::Eq(operand.clone()),
            Operator::Ne => OperatorTest::Ne(operand.clone()),
            Operator::Lt => OperatorTest::Order(Bound::Lt, operand.clone()),
            Operator::Lte => OperatorTest::Order(Bound::Lte, operand.clone()),
            Operator::Gt => OperatorTest::Order(Bound::Gt, operand.clone()),
            Operator::Gte => OperatorTest::Order(Bound::Gte, operand.clone()),
            Operator::In => OperatorTest::In(array_operand()?),
            Operator::Nin => OperatorTest::Nin(array_operand()?),
            Operator::InstanceOf => match operand {
                Bson::String(name) => OperatorTest::InstanceOf(name.parse()?),
                other => return Err(CollectionError::InvalidOperand(
                    operator.token().to_string(),
                    format!("expected a type name, got {}", type_name(other)),
                )),
            },
        })
    }
}

impl<'a> ConstraintVisitor for ConstraintCompiler<'a> {
    type Output = FieldMatcher;
    type Error = CollectionError;

    fn visit_literal(&mut self, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(FieldMatcher::Literal(value.clone()))
    }

    fn visit_operators(&mut self, operators: &Document) -> Result<Self::Output, Self::Error> {
        let mut tests = Vec::with_capacity(operators.len());

        for (token, operand) in operators {
            match Operator::parse(token) {
                Some(operator) => tests.push(self.compile_operator(operator, operand)?),
                None if self.strict => {
                    return Err(CollectionError::UnknownOperator(token.clone(), self.field.to_string()));
                },
                None => tracing::warn!(
                    field = self.field,
                    operator = %token,
                    "ignoring unrecognized query operator"
                ),
            }
        }

        Ok(FieldMatcher::Operators(tests))
    }

    fn visit_identifier(&mut self, id: &Identifier) -> Result<Self::Output, Self::Error> {
        Ok(FieldMatcher::Identifier(id.canonical()))
    }

    fn visit_predicate(&mut self, predicate: &Arc<PredicateFn>) -> Result<Self::Output, Self::Error> {
        Ok(FieldMatcher::Predicate(Arc::clone(predicate)))
    }

    fn visit_evaluator(&mut self, evaluator: &Arc<dyn Evaluate>) -> Result<Self::Output, Self::Error> {
        Ok(FieldMatcher::Evaluator(Arc::clone(evaluator)))
    }
}

/// A compiled filter: a predicate over whole documents.
///
/// Each field's value (looked up by dotted path, `null` when absent) must
/// satisfy that field's constraint. Evaluation stops at the first failing
/// field, so caller predicates on later fields may not run.
pub struct Matcher {
    fields: Vec<(String, FieldMatcher)>,
}

impl Matcher {
    /// Compiles a filter, skipping unrecognized operators with a warning.
    pub fn compile(filter: &Filter) -> CollectionResult<Self> {
        Self::compile_with(filter, false)
    }

    /// Compiles a filter, rejecting unrecognized operators.
    pub fn compile_strict(filter: &Filter) -> CollectionResult<Self> {
        Self::compile_with(filter, true)
    }

    pub(crate) fn compile_with(filter: &Filter, strict: bool) -> CollectionResult<Self> {
        Ok(Self {
            fields: filter
                .iter()
                .map(|(field, constraint)| {
                    ConstraintCompiler::new(field, strict)
                        .visit_constraint(constraint)
                        .map(|matcher| (field.to_string(), matcher))
                })
                .collect::<CollectionResult<Vec<_>>>()?,
        })
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, document: &Document) -> CollectionResult<bool> {
        for (field, matcher) in &self.fields {
            let value = lookup(document, field).unwrap_or(&MISSING);

            if !matcher.matches(value)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
