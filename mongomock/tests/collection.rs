use bson::{Bson, Document, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use mongomock::{document::from_document, prelude::*};

fn collect(cursor: Cursor) -> Vec<Document> {
    cursor
        .collect::<CollectionResult<Vec<_>>>()
        .unwrap()
}

fn ints(documents: &[Document], field: &str) -> Vec<i32> {
    documents
        .iter()
        .map(|document| document.get_i32(field).unwrap())
        .collect()
}

#[test]
fn insert_assigns_distinct_ids_to_the_same_document() {
    let mut collection = MockCollection::new("things");
    let document = doc! { "name": "twice" };

    let first = collection.insert_one(&document).unwrap();
    let second = collection.insert_one(&document).unwrap();

    assert_ne!(first.inserted_id, second.inserted_id);
    assert!(!document.contains_key(ID_FIELD));
    assert_eq!(collection.documents().len(), 2);
}

#[test]
fn insert_many_returns_ids_in_order() {
    let mut collection = MockCollection::default();
    let result = collection
        .insert_many(vec![doc! { "_id": "a" }, doc! { "n": 1 }, doc! { "_id": "c" }])
        .unwrap();

    assert_eq!(result.inserted_ids.len(), 3);
    assert_eq!(result.inserted_ids[0], Bson::String("a".into()));
    assert!(matches!(result.inserted_ids[1], Bson::ObjectId(_)));
    assert_eq!(result.inserted_ids[2], Bson::String("c".into()));
}

#[test]
fn find_all_returns_insertion_order() {
    let mut collection = MockCollection::default();
    collection
        .insert_many((0..4).map(|n| doc! { "n": 3 - n }))
        .unwrap();

    let found = collect(collection.find(doc! {}, None).unwrap());

    assert_eq!(ints(&found, "n"), vec![3, 2, 1, 0]);
}

#[test]
fn sort_is_stable_and_multi_key() {
    let mut collection = MockCollection::default();
    collection
        .insert_many(vec![
            doc! { "a": 1, "b": 2 },
            doc! { "a": 1, "b": 1 },
            doc! { "a": 2, "b": 0 },
        ])
        .unwrap();

    let options = FindOptions::builder()
        .sort_by(Sort::try_from(doc! { "a": 1, "b": 1 }).unwrap())
        .build();
    let found = collect(collection.find(doc! {}, options).unwrap());

    assert_eq!(ints(&found, "a"), vec![1, 1, 2]);
    assert_eq!(ints(&found, "b"), vec![1, 2, 0]);
}

#[test]
fn sort_happens_before_skip() {
    let mut collection = MockCollection::default();
    collection
        .insert_many(vec![doc! { "n": 2 }, doc! { "n": 3 }, doc! { "n": 1 }])
        .unwrap();

    let options = FindOptions::builder()
        .sort("n", SortDirection::Desc)
        .skip(1)
        .build();
    let found = collect(collection.find(doc! {}, options).unwrap());

    assert_eq!(ints(&found, "n"), vec![2, 1]);
}

#[test]
fn skip_drops_leading_matches() {
    let mut collection = MockCollection::default();
    collection
        .insert_many(vec![doc! { "n": 1 }, doc! { "n": 2 }, doc! { "n": 3 }])
        .unwrap();

    let found = collect(collection.find(doc! {}, FindOptions::builder().skip(1).build()).unwrap());

    assert_eq!(ints(&found, "n"), vec![2, 3]);
}

#[test]
fn delete_many_keeps_survivor_order_dense() {
    let mut collection = MockCollection::default();
    collection
        .insert_many((0..6).map(|n| doc! { "n": n, "odd": n % 2 == 1 }))
        .unwrap();

    let result = collection.delete_many(doc! { "odd": true }).unwrap();

    assert_eq!(result.deleted_count, 3);
    assert_eq!(ints(collection.documents(), "n"), vec![0, 2, 4]);
    assert_eq!(collection.documents()[2].get_i32("n").unwrap(), 4);
}

#[test]
fn update_one_updates_every_match() {
    let mut collection = MockCollection::default();
    collection
        .insert_many(vec![doc! { "x": 1 }, doc! { "x": 2 }, doc! { "x": 1 }])
        .unwrap();

    let result = collection
        .update_one(doc! { "x": 1 }, doc! { "$set": { "y": 2 } })
        .unwrap();

    assert_eq!(result.matched_count, 2);

    let updated = collect(collection.find(doc! { "y": 2 }, None).unwrap());
    assert_eq!(ints(&updated, "x"), vec![1, 1]);
    assert!(!collection.documents()[1].contains_key("y"));
}

#[test]
fn count_reflects_deletes() {
    let mut collection = MockCollection::default();
    collection
        .insert_many((0..5).map(|n| doc! { "n": n }))
        .unwrap();

    assert_eq!(collection.count(doc! {}, None).unwrap(), 5);

    collection.delete_many(doc! { "n": { "$lt": 2 } }).unwrap();

    assert_eq!(collection.count(doc! {}, None).unwrap(), 3);
    assert_eq!(collection.count(doc! { "n": { "$lte": 2 } }, None).unwrap(), 1);
}

#[test]
fn drop_empties_the_collection_without_disabling_it() {
    let mut collection = MockCollection::default();
    collection.insert_one(&doc! { "n": 1 }).unwrap();

    collection.drop().unwrap();

    assert!(collection.is_dropped());
    assert!(collection.documents().is_empty());
    assert!(collect(collection.find(doc! {}, None).unwrap()).is_empty());

    collection.insert_one(&doc! { "n": 2 }).unwrap();
    assert_eq!(collection.count(doc! {}, None).unwrap(), 1);
}

#[test]
fn every_find_is_logged_once() {
    let mut collection = MockCollection::default();
    collection.insert_one(&doc! { "n": 1 }).unwrap();

    collection.find(doc! { "n": 1 }, None).unwrap();
    collection.find(doc! { "n": 99 }, FindOptions::builder().skip(3).build()).unwrap();
    assert!(collection.find_one(doc! { "n": 42 }, None).unwrap().is_none());
    assert!(collection.find_one(doc! {}, None).unwrap().is_some());
    collection.count(doc! {}, None).unwrap();

    let queries = collection.queries();

    assert_eq!(queries.len(), 4);
    assert!(matches!(queries[1].filter.get("n"), Some(Constraint::Literal(Bson::Int32(99)))));
    assert_eq!(queries[1].options.skip, Some(3));
    assert!(queries[3].filter.is_empty());
    assert!(queries[0].issued_at <= queries[3].issued_at);
}

#[test]
fn object_id_matches_its_string_form() {
    let mut collection = MockCollection::default();
    let id = collection.insert_one(&doc! { "n": 1 }).unwrap().inserted_id;
    let oid = id.as_object_id().unwrap();

    let by_hex = collection.find_one(doc! { "_id": oid.to_hex() }, None).unwrap();
    let by_identifier = collection
        .find_one(Filter::new().constraint("_id", Constraint::from(Identifier::from(oid))), None)
        .unwrap();

    assert_eq!(by_hex.unwrap().get(ID_FIELD), Some(&id));
    assert!(by_identifier.is_some());

    collection.insert_one(&doc! { "_id": oid.to_hex(), "n": 2 }).unwrap();
    let stored_as_string = collect(collection.find(doc! { "_id": oid }, None).unwrap());
    assert_eq!(ints(&stored_as_string, "n"), vec![1, 2]);

    let by_operator = collect(collection.find(doc! { "_id": { "$eq": oid } }, None).unwrap());
    assert_eq!(ints(&by_operator, "n"), vec![1, 2]);

    assert!(collection.find_one(doc! { "_id": ObjectId::new() }, None).unwrap().is_none());
}

#[test]
fn uuid_identifiers_match_by_canonical_form() {
    let uuid = uuid::Uuid::new_v4();
    let mut collection = MockCollection::default();
    collection
        .insert_one(&doc! { "_id": Bson::from(Identifier::from(uuid)), "n": 1 })
        .unwrap();

    let found = collection
        .find_one(Filter::new().constraint("_id", Constraint::from(Identifier::from(uuid))), None)
        .unwrap();

    assert!(found.is_some());
    assert_eq!(collection.count(doc! { "_id": uuid.to_string() }, None).unwrap(), 1);
    assert_eq!(collection.count(doc! { "_id": { "$in": [uuid.to_string()] } }, None).unwrap(), 1);
    assert_eq!(collection.count(doc! { "_id": uuid::Uuid::new_v4().to_string() }, None).unwrap(), 0);
}

#[test]
fn unknown_operators_are_ignored_by_default() {
    let mut collection = MockCollection::default();
    collection.insert_many(vec![doc! { "n": 1 }, doc! { "n": 5 }]).unwrap();

    let found = collect(collection.find(doc! { "n": { "$lte": 3, "$typo": 1 } }, None).unwrap());
    assert_eq!(ints(&found, "n"), vec![1]);

    let mut strict = MockCollection::builder()
        .strict_operators(true)
        .documents(vec![doc! { "n": 1 }])
        .build()
        .unwrap();

    assert!(matches!(
        strict.find(doc! { "n": { "$typo": 1 } }, None),
        Err(CollectionError::UnknownOperator(_, _)),
    ));
}

#[test]
fn partial_consumption_is_allowed() {
    let mut collection = MockCollection::default();
    collection.insert_many((0..100).map(|n| doc! { "n": n })).unwrap();

    let mut cursor = collection.find(doc! { "n": { "$instanceOf": "int" } }, None).unwrap();

    assert_eq!(cursor.next().unwrap().unwrap().get_i32("n").unwrap(), 0);
    assert!(cursor.has_next());
    drop(cursor);
}

struct OneOf(Vec<&'static str>);

impl Evaluate for OneOf {
    fn evaluate(&self, value: &Bson) -> bool {
        value
            .as_str()
            .is_some_and(|value| self.0.contains(&value))
    }
}

#[test]
fn comparator_objects_filter_documents() {
    let mut collection = MockCollection::default();
    collection
        .insert_many(vec![doc! { "role": "admin" }, doc! { "role": "guest" }, doc! { "role": "owner" }])
        .unwrap();

    let filter = Filter::new().constraint("role", Constraint::evaluator(OneOf(vec!["admin", "owner"])));

    assert_eq!(collection.count(filter, None).unwrap(), 2);
}

#[test]
fn predicate_errors_abort_the_scan() {
    let mut collection = MockCollection::default();
    collection.insert_many(vec![doc! { "n": 1 }, doc! { "n": 2 }, doc! { "n": 3 }]).unwrap();

    let filter = Filter::new().constraint(
        "n",
        Constraint::try_predicate(|value| match value.as_i32() {
            Some(2) => Err(CollectionError::Predicate("two is not allowed".into())),
            _ => Ok(true),
        }),
    );

    let results = collection.find(filter, None).unwrap().collect::<Vec<_>>();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(&results[1], Err(CollectionError::Predicate(message)) if message == "two is not allowed"));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: i32,
    active: bool,
}

fn deactivate_older_than<C: DocumentCollection>(users: &mut C, age: i32) -> CollectionResult<u64> {
    let result = users.update_one(doc! { "age": { "$gt": age } }, doc! { "$set": { "active": false } })?;
    Ok(result.modified_count)
}

#[test]
fn typed_documents_through_the_collection_trait() {
    let mut users = MockCollection::new("users");
    users
        .insert_many(vec![
            User { name: "Alice".into(), age: 30, active: true },
            User { name: "Bob".into(), age: 41, active: true },
            User { name: "Carol".into(), age: 52, active: false },
        ])
        .unwrap();

    assert_eq!(deactivate_older_than(&mut users, 40).unwrap(), 1);

    let mut active = users
        .find(doc! { "active": true }, None)
        .unwrap()
        .map(|document| from_document::<User>(document.unwrap()).unwrap());

    assert_eq!(active.next().map(|user| user.name), Some("Alice".to_string()));
    assert!(active.next().is_none());
}

#[test]
fn json_values_are_normalized_to_documents() {
    let mut collection = MockCollection::default();
    collection
        .insert_one(&serde_json::json!({ "name": "Alice", "tags": ["a", "b"], "address": { "city": "Oslo" } }))
        .unwrap();

    assert_eq!(collection.count(doc! { "address.city": "Oslo" }, None).unwrap(), 1);
    assert_eq!(collection.count(doc! { "tags": ["a", "b"] }, None).unwrap(), 1);
    assert_eq!(collection.count(doc! { "tags.1": "b" }, None).unwrap(), 1);
    assert!(collection.insert_one(&serde_json::json!([1, 2])).is_err());
}

#[test]
fn cursor_can_be_consumed_as_a_stream() {
    use futures::{TryStreamExt, executor::block_on};

    let mut collection = MockCollection::default();
    collection.insert_many((0..3).map(|n| doc! { "n": n })).unwrap();

    let cursor = collection.find(doc! { "n": { "$gte": 1 } }, None).unwrap();
    let found = block_on(TryStreamExt::try_collect::<Vec<_>>(cursor)).unwrap();

    assert_eq!(ints(&found, "n"), vec![1, 2]);
}

#[test]
fn index_registry_has_no_effect_on_queries() {
    let mut collection = MockCollection::default();
    collection.insert_many(vec![doc! { "email": "a" }, doc! { "email": "a" }]).unwrap();

    let index = collection
        .create_index(doc! { "email": 1 }, IndexOptions { unique: Some(true), ..Default::default() })
        .unwrap();

    assert_eq!(index.index_name, "email_1");
    assert_eq!(collection.indexes()[0].keys, doc! { "email": 1 });
    assert_eq!(collection.count(doc! { "email": "a" }, None).unwrap(), 2);
}
