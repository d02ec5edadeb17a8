use autoadmin::store::ensure_table;
use autoadmin::{
    connect, AppError, ColumnDef, ColumnKind, Entity, ModelAdapter, ModelDescriptor, Schema,
    SqliteUserStore, TableDef,
};
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;

struct Author;

impl Entity for Author {
    fn schema() -> Schema {
        Schema::Table(TableDef {
            name: "authors",
            columns: vec![
                ColumnDef::new("id", ColumnKind::Integer).primary_key(),
                ColumnDef::new("name", ColumnKind::Text),
                ColumnDef::new("email", ColumnKind::Text).nullable().unique(),
                ColumnDef::new("born", ColumnKind::Integer).nullable(),
                ColumnDef::new("active", ColumnKind::Boolean).default_value(true),
            ],
        })
    }
}

struct Tag;

impl Entity for Tag {
    fn schema() -> Schema {
        Schema::Table(TableDef {
            name: "tags",
            columns: vec![
                ColumnDef::new("slug", ColumnKind::Text).primary_key(),
                ColumnDef::new("label", ColumnKind::Text),
            ],
        })
    }
}

async fn setup() -> (SqlitePool, ModelDescriptor) {
    let pool = connect("sqlite::memory:").await.unwrap();
    let model = ModelDescriptor::of::<Author>("Author").unwrap();
    ensure_table(&pool, &model).await.unwrap();
    (pool, model)
}

fn form(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

#[tokio::test]
async fn create_normalises_empty_strings_and_applies_defaults() {
    let (pool, model) = setup().await;
    let alice = ModelAdapter::create(&pool, &model, &form(&[("name", "Alice"), ("email", "")]))
        .await
        .unwrap();
    assert_eq!(alice.get("name"), Some(&json!("Alice")));
    assert_eq!(alice.get("email"), Some(&Value::Null));
    assert_eq!(alice.get("active"), Some(&json!(true)));
    assert!(alice.key(&model).as_i64().is_some());
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let (pool, model) = setup().await;
    let alice = ModelAdapter::create(
        &pool,
        &model,
        &form(&[("name", "Alice"), ("email", "alice@example.com"), ("born", "1815")]),
    )
    .await
    .unwrap();
    let updated = ModelAdapter::update(&pool, &model, &alice, &form(&[("name", "Alicia")]))
        .await
        .unwrap();
    assert_eq!(updated.key(&model), alice.key(&model));
    assert_eq!(updated.get("name"), Some(&json!("Alicia")));
    assert_eq!(updated.get("email"), Some(&json!("alice@example.com")));
    assert_eq!(updated.get("born"), Some(&json!(1815)));
}

#[tokio::test]
async fn update_never_rewrites_the_primary_key() {
    let (pool, model) = setup().await;
    let alice = ModelAdapter::create(&pool, &model, &form(&[("name", "Alice")]))
        .await
        .unwrap();
    let updated = ModelAdapter::update(&pool, &model, &alice, &form(&[("id", "999"), ("name", "A")]))
        .await
        .unwrap();
    assert_eq!(updated.key(&model), alice.key(&model));
}

#[tokio::test]
async fn delete_then_get_is_absent() {
    let (pool, model) = setup().await;
    let alice = ModelAdapter::create(&pool, &model, &form(&[("name", "Alice")]))
        .await
        .unwrap();
    ModelAdapter::delete(&pool, &model, &alice).await.unwrap();
    let found = ModelAdapter::get_by_key(&pool, &model, &alice.key(&model))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn update_of_vanished_row_is_record_not_found() {
    let (pool, model) = setup().await;
    let alice = ModelAdapter::create(&pool, &model, &form(&[("name", "Alice")]))
        .await
        .unwrap();
    ModelAdapter::delete(&pool, &model, &alice).await.unwrap();
    let err = ModelAdapter::update(&pool, &model, &alice, &form(&[("name", "Ghost")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RecordNotFound { .. }));
}

#[tokio::test]
async fn store_rejections_are_constraint_violations() {
    let (pool, model) = setup().await;
    ModelAdapter::create(&pool, &model, &form(&[("name", "A"), ("email", "dup@example.com")]))
        .await
        .unwrap();
    let dup = ModelAdapter::create(&pool, &model, &form(&[("name", "B"), ("email", "dup@example.com")]))
        .await
        .unwrap_err();
    assert!(matches!(dup, AppError::ConstraintViolation(_)), "{:?}", dup);

    let missing_name = ModelAdapter::create(&pool, &model, &form(&[("name", "")]))
        .await
        .unwrap_err();
    assert!(matches!(missing_name, AppError::ConstraintViolation(_)), "{:?}", missing_name);
}

#[tokio::test]
async fn uncoercible_values_are_invalid_and_unknown_fields_ignored() {
    let (pool, model) = setup().await;
    let err = ModelAdapter::create(&pool, &model, &form(&[("name", "A"), ("born", "long ago")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidValue { ref field, .. } if field == "born"));

    let ok = ModelAdapter::create(&pool, &model, &form(&[("name", "A"), ("nickname", "x")]))
        .await
        .unwrap();
    assert!(ok.get("nickname").is_none());
}

#[tokio::test]
async fn list_pages_in_storage_order() {
    let (pool, model) = setup().await;
    for i in 0..5 {
        let name = format!("author-{}", i);
        ModelAdapter::create(&pool, &model, &form(&[("name", name.as_str())]))
            .await
            .unwrap();
    }
    let all = ModelAdapter::list(&pool, &model, None, None).await.unwrap();
    assert_eq!(all.len(), 5);

    let page = ModelAdapter::list(&pool, &model, Some(1), Some(2)).await.unwrap();
    let names: Vec<&Value> = page.iter().filter_map(|r| r.get("name")).collect();
    assert_eq!(names, vec![&json!("author-1"), &json!("author-2")]);
}

#[tokio::test]
async fn text_key_must_be_supplied() {
    let pool = connect("sqlite::memory:").await.unwrap();
    let model = ModelDescriptor::of::<Tag>("Tag").unwrap();
    ensure_table(&pool, &model).await.unwrap();

    let err = ModelAdapter::create(&pool, &model, &form(&[("label", "x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)), "{:?}", err);
    let err = ModelAdapter::create(&pool, &model, &form(&[("slug", ""), ("label", "x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)), "{:?}", err);
    assert!(ModelAdapter::list(&pool, &model, None, None).await.unwrap().is_empty());

    let rust = ModelAdapter::create(&pool, &model, &form(&[("slug", "rust"), ("label", "Rust")]))
        .await
        .unwrap();
    assert_eq!(rust.key(&model), json!("rust"));
    let fetched = ModelAdapter::get_by_key(&pool, &model, &json!("rust")).await.unwrap();
    assert_eq!(fetched.unwrap().get("label"), Some(&json!("Rust")));
}

#[tokio::test]
async fn generic_user_create_stamps_created_at() {
    let pool = connect("sqlite::memory:").await.unwrap();
    let users = SqliteUserStore::new(pool.clone());
    users.init_schema().await.unwrap();
    let model = SqliteUserStore::descriptor();

    let created = ModelAdapter::create(
        &pool,
        &model,
        &form(&[
            ("username", "ada"),
            ("email", "ada@example.com"),
            ("hashed_password", "x"),
        ]),
    )
    .await
    .unwrap();
    let at = created.get("created_at").and_then(Value::as_str).unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(at).is_ok(), "{}", at);
    assert_eq!(created.get("is_active"), Some(&json!(true)));
}
