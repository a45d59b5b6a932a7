//! Document normalization, identifiers and field access.
//!
//! Documents are stored as [`bson::Document`] values. Anything that serializes
//! through serde can be inserted; it is normalized into a document here before
//! it reaches the store.

use std::{fmt, str::FromStr};

use bson::{
    Binary, Bson, Document,
    de::deserialize_from_bson,
    oid::ObjectId,
    ser::serialize_to_bson,
    spec::BinarySubtype,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{CollectionError, CollectionResult};

/// The reserved identifier field of every stored document.
pub const ID_FIELD: &str = "_id";

/// A document identifier that can be compared by its canonical string form.
///
/// Stored identifiers may be ObjectIds, UUID binaries or plain strings. Two
/// identifiers are considered equal when their canonical strings are equal,
/// regardless of how either side is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// A BSON ObjectId, rendered as lowercase hex.
    ObjectId(ObjectId),
    /// A UUID, stored as binary subtype 4 and rendered hyphenated.
    Uuid(uuid::Uuid),
}

impl Identifier {
    /// Generates a fresh, globally unique ObjectId identifier.
    pub fn new() -> Self {
        Identifier::ObjectId(ObjectId::new())
    }

    /// Returns the canonical string form of this identifier.
    pub fn canonical(&self) -> String {
        match self {
            Identifier::ObjectId(oid) => oid.to_hex(),
            Identifier::Uuid(uuid) => uuid.hyphenated().to_string(),
        }
    }

    /// Returns the canonical identifier string of a stored value, if it has one.
    ///
    /// Strings are their own canonical form so a filter can match an ObjectId
    /// given as hex, and vice versa.
    pub fn canonical_of(value: &Bson) -> Option<String> {
        match value {
            Bson::ObjectId(oid) => Some(oid.to_hex()),
            Bson::Binary(Binary { subtype: BinarySubtype::Uuid, bytes }) => uuid::Uuid::from_slice(bytes)
                .ok()
                .map(|uuid| uuid.hyphenated().to_string()),
            Bson::String(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl Default for Identifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<ObjectId> for Identifier {
    fn from(oid: ObjectId) -> Self {
        Identifier::ObjectId(oid)
    }
}

impl From<uuid::Uuid> for Identifier {
    fn from(uuid: uuid::Uuid) -> Self {
        Identifier::Uuid(uuid)
    }
}

impl From<Identifier> for Bson {
    fn from(id: Identifier) -> Self {
        match id {
            Identifier::ObjectId(oid) => Bson::ObjectId(oid),
            Identifier::Uuid(uuid) => Bson::Binary(Binary {
                subtype: BinarySubtype::Uuid,
                bytes: uuid.as_bytes().to_vec(),
            }),
        }
    }
}

/// Normalizes any serializable value into a BSON document.
///
/// # Errors
///
/// Returns [`CollectionError::Serialization`] if serialization fails and
/// [`CollectionError::InvalidDocument`] if the value is not document-shaped.
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> CollectionResult<Document> {
    match serialize_to_bson(value)? {
        Bson::Document(document) => Ok(document),
        other => Err(CollectionError::InvalidDocument(format!(
            "expected a document, got {}",
            type_name(&other),
        ))),
    }
}

/// Deserializes a stored document into a typed value.
pub fn from_document<T: DeserializeOwned>(document: Document) -> CollectionResult<T> {
    Ok(deserialize_from_bson(Bson::Document(document))?)
}

/// Resolves a possibly dotted field path against a document.
///
/// A top-level key that contains dots wins over path traversal. Path segments
/// index into nested documents by key and into arrays by position.
pub fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    if let Some(value) = document.get(path) {
        return Some(value);
    }

    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(inner) => inner.get(segment)?,
            Bson::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Coarse runtime type of a BSON value, as named by `$instanceOf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Long,
    Double,
    Decimal,
    /// Any of int, long, double or decimal.
    Number,
    String,
    Object,
    Array,
    Binary,
    ObjectId,
    Date,
    Timestamp,
    Regex,
}

impl ValueKind {
    /// Returns true if `value` is of this kind.
    pub fn matches(&self, value: &Bson) -> bool {
        match (self, value) {
            (ValueKind::Null, Bson::Null)
            | (ValueKind::Bool, Bson::Boolean(_))
            | (ValueKind::Int, Bson::Int32(_))
            | (ValueKind::Long, Bson::Int64(_))
            | (ValueKind::Double, Bson::Double(_))
            | (ValueKind::Decimal, Bson::Decimal128(_))
            | (ValueKind::String, Bson::String(_))
            | (ValueKind::Object, Bson::Document(_))
            | (ValueKind::Array, Bson::Array(_))
            | (ValueKind::Binary, Bson::Binary(_))
            | (ValueKind::ObjectId, Bson::ObjectId(_))
            | (ValueKind::Date, Bson::DateTime(_))
            | (ValueKind::Timestamp, Bson::Timestamp(_))
            | (ValueKind::Regex, Bson::RegularExpression(_)) => true,
            (ValueKind::Number, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_)) => true,
            _ => false,
        }
    }
}

impl FromStr for ValueKind {
    type Err = CollectionError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "null" => ValueKind::Null,
            "bool" => ValueKind::Bool,
            "int" => ValueKind::Int,
            "long" => ValueKind::Long,
            "double" => ValueKind::Double,
            "decimal" => ValueKind::Decimal,
            "number" => ValueKind::Number,
            "string" => ValueKind::String,
            "object" => ValueKind::Object,
            "array" => ValueKind::Array,
            "binData" => ValueKind::Binary,
            "objectId" => ValueKind::ObjectId,
            "date" => ValueKind::Date,
            "timestamp" => ValueKind::Timestamp,
            "regex" => ValueKind::Regex,
            other => return Err(CollectionError::InvalidOperand(
                "$instanceOf".to_string(),
                format!("unknown type name {other:?}"),
            )),
        })
    }
}

/// Short type name of a BSON value, used in error messages.
pub fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Null => "null",
        Bson::Boolean(_) => "bool",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::Double(_) => "double",
        Bson::Decimal128(_) => "decimal",
        Bson::String(_) => "string",
        Bson::Document(_) => "object",
        Bson::Array(_) => "array",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Timestamp(_) => "timestamp",
        Bson::RegularExpression(_) => "regex",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        age: i32,
    }

    #[test]
    fn test_lookup_nested_paths() {
        let document = doc! {
            "a": { "b": [ { "c": 1 }, { "c": 2 } ] },
            "x.y": "literal",
        };

        assert_eq!(lookup(&document, "a.b.1.c"), Some(&Bson::Int32(2)));
        assert_eq!(lookup(&document, "x.y"), Some(&Bson::String("literal".into())));
        assert_eq!(lookup(&document, "a.missing"), None);
        assert_eq!(lookup(&document, "a.b.9"), None);
        assert_eq!(lookup(&document, "nothing"), None);
    }

    #[test]
    fn test_to_document_roundtrips_structs() {
        let user = User { name: "Alice".into(), age: 30 };
        let document = to_document(&user).unwrap();

        assert_eq!(document, doc! { "name": "Alice", "age": 30 });
        assert_eq!(from_document::<User>(document).unwrap(), user);
    }

    #[test]
    fn test_to_document_rejects_scalars() {
        assert!(matches!(to_document(&42), Err(CollectionError::InvalidDocument(_))));
    }

    #[test]
    fn test_identifier_canonical_forms() {
        let oid = ObjectId::new();
        let uuid = uuid::Uuid::new_v4();

        assert_eq!(Identifier::canonical_of(&Bson::ObjectId(oid)), Some(oid.to_hex()));
        assert_eq!(
            Identifier::canonical_of(&Bson::from(Identifier::Uuid(uuid))),
            Some(uuid.to_string()),
        );
        assert_eq!(Identifier::canonical_of(&Bson::Int32(1)), None);
        assert_ne!(Identifier::new(), Identifier::new());
    }

    #[test]
    fn test_value_kind_names() {
        assert_eq!("number".parse::<ValueKind>().unwrap(), ValueKind::Number);
        assert!(ValueKind::Number.matches(&Bson::Int64(3)));
        assert!(!ValueKind::Int.matches(&Bson::Double(3.0)));
        assert!("Widget".parse::<ValueKind>().is_err());
    }
}
