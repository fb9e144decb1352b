use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use trellis::error::ConfigError;
use trellis::model::{casts, relations, Attribute, CastError, HydrationError, Identifier, ModelSchema, Relation};

fn author_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("Author")
        .identifier("id")
        .cast("age", casts::integer)
        .build()
}

fn book_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("Book")
        .identifier("isbn")
        .cast("price", casts::float)
        .relation("author", relations::has_one(author_schema()))
        .relation("reviewers", relations::has_many(author_schema()))
        .build()
}

#[test]
fn casts_apply_to_live_and_original_but_not_raw() {
    let author = author_schema().hydrate(json!({ "id": 1, "age": "42" })).unwrap();

    assert_eq!(author.value("age"), Some(&json!(42)));
    assert_eq!(author.original().get("age"), Some(&Attribute::Value(json!(42))));
    assert_eq!(author.raw_data().get("age"), Some(&json!("42")));
    assert!(!author.is_dirty());
}

#[test]
fn fields_without_a_caster_are_copied_verbatim() {
    let author = author_schema()
        .hydrate(json!({ "id": 1, "name": "Ursula", "tags": ["sf"] }))
        .unwrap();

    assert_eq!(author.value("name"), Some(&json!("Ursula")));
    assert_eq!(author.value("tags"), Some(&json!(["sf"])));
    assert_eq!(author.value("age"), None);
}

#[test]
fn relations_follow_the_input_shape() {
    let book = book_schema()
        .hydrate(json!({
            "isbn": "978-0",
            "price": "9.5",
            "author": { "id": 1, "age": "80" },
            "reviewers": [{ "id": 2 }, { "id": 3, "age": 30 }],
        }))
        .unwrap();

    let author = book.related("author").unwrap();
    assert_eq!(author.schema().name(), "Author");
    assert_eq!(author.value("age"), Some(&json!(80)));

    let reviewers = book.related_many("reviewers").unwrap();
    assert_eq!(reviewers.len(), 2);
    assert_eq!(reviewers[1].identifier().unwrap(), Some(Identifier::from(3i64)));

    assert_eq!(book.value("price"), Some(&json!(9.5)));
    assert_eq!(book.raw_data().get("author"), Some(&json!({ "id": 1, "age": "80" })));
}

#[test]
fn null_relations_are_left_alone() {
    let book = book_schema().hydrate(json!({ "isbn": "1", "author": null })).unwrap();
    assert_eq!(book.value("author"), Some(&serde_json::Value::Null));
    assert!(book.related("author").is_none());
}

#[test]
fn related_hydrator_accepts_either_shape() {
    let schema = ModelSchema::builder("Shelf")
        .relation("books", relations::related(author_schema()))
        .build();

    let one = schema.hydrate(json!({ "books": { "id": 1 } })).unwrap();
    assert!(one.related("books").is_some());

    let many = schema.hydrate(json!({ "books": [{ "id": 1 }] })).unwrap();
    assert_eq!(many.related_many("books").map(<[_]>::len), Some(1));
}

#[test]
fn hydrator_with_the_wrong_shape_is_rejected() {
    let author = author_schema();
    let schema = ModelSchema::builder("Book")
        .relation("author", move |value: serde_json::Value, _draft: &trellis::model::ModelDraft<'_>| {
            author.hydrate(value).map(|entity| Relation::Many(vec![entity]))
        })
        .build();

    let err = schema.hydrate(json!({ "author": { "id": 1 } })).unwrap_err();
    assert!(matches!(err, HydrationError::ShapeMismatch { ref field, .. } if field == "author"));
}

#[test]
fn has_many_requires_an_array() {
    let err = book_schema()
        .hydrate(json!({ "reviewers": { "id": 1 } }))
        .unwrap_err();
    match err {
        HydrationError::Relation { field, source, .. } => {
            assert_eq!(field, "reviewers");
            assert!(matches!(*source, HydrationError::NotACollection { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn caster_failure_produces_no_entity() {
    let err = author_schema().hydrate(json!({ "age": "forty" })).unwrap_err();
    match err {
        HydrationError::Cast { model, field, .. } => {
            assert_eq!(model, "Author");
            assert_eq!(field, "age");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn casters_see_fields_cast_before_them() {
    let schema = ModelSchema::builder("Line")
        .cast("qty", casts::integer)
        .cast("total", |value: serde_json::Value, draft: &trellis::model::ModelDraft<'_>| {
            let qty = draft.value("qty").and_then(serde_json::Value::as_i64).ok_or_else(|| CastError::new("qty missing"))?;
            let price = value.as_i64().ok_or_else(|| CastError::new("price must be an integer"))?;
            Ok(json!(qty * price))
        })
        .build();

    let line = schema.hydrate(json!({ "qty": "3", "total": 5 })).unwrap();
    assert_eq!(line.value("total"), Some(&json!(15)));
}

#[test]
fn non_object_input_is_rejected() {
    let err = author_schema().hydrate(json!([1, 2])).unwrap_err();
    assert!(matches!(err, HydrationError::NotAnObject { found: "an array", .. }));
}

#[test]
fn identifier_reads_the_declared_key() {
    let author = author_schema().hydrate(json!({ "id": 7 })).unwrap();
    assert_eq!(author.identifier().unwrap(), Some(Identifier::from(7i64)));

    let book = book_schema().hydrate(json!({ "isbn": "978-3" })).unwrap();
    assert_eq!(book.identifier().unwrap(), Some(Identifier::from("978-3")));

    let anonymous = author_schema().hydrate(json!({ "age": 1 })).unwrap();
    assert_eq!(anonymous.identifier().unwrap(), None);
}

#[test]
fn identifier_without_a_declared_key_is_a_config_error() {
    let schema = ModelSchema::builder("Tag").build();
    let tag = schema.hydrate(json!({ "id": 7 })).unwrap();

    assert_eq!(
        tag.identifier(),
        Err(ConfigError::MissingIdentifierKey { model: "Tag".to_string() })
    );
}

#[test]
fn changes_are_tracked_against_the_original() {
    let mut author = author_schema().hydrate(json!({ "id": 1, "age": 40, "name": "Le Guin" })).unwrap();

    author.set("age", json!(41));
    author.remove("name");
    author.set("email", json!("ursula@example.org"));

    assert_eq!(author.dirty_fields(), ["age", "email", "name"]);
    assert_eq!(author.original().get("age"), Some(&Attribute::Value(json!(40))));

    author.set("age", json!(40));
    assert_eq!(author.dirty_fields(), ["email", "name"]);
}

#[test]
fn entities_deserialize_into_plain_structs() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Author {
        id: u64,
        age: i64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Book {
        isbn: String,
        author: Author,
    }

    let book = book_schema()
        .hydrate(json!({ "isbn": "1", "author": { "id": 2, "age": "50" } }))
        .unwrap();

    assert_eq!(
        book.deserialize::<Book>().unwrap(),
        Book {
            isbn: "1".to_string(),
            author: Author { id: 2, age: 50 },
        }
    );
}
