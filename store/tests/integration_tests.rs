//! End-to-end tests for the SQLite adapter against a live connection.

use std::collections::BTreeMap;

use trellis_core::schema::{DataType, TableSchema};
use trellis_core::value::Value;
use trellis_store::{ColumnSpecs, SqliteStore, Store};

fn specs(columns: &[(&str, DataType)]) -> ColumnSpecs {
    columns
        .iter()
        .map(|(name, data_type)| (name.to_string(), *data_type))
        .collect()
}

fn schema(columns: &[(&str, DataType)]) -> TableSchema {
    TableSchema {
        columns: columns
            .iter()
            .map(|(name, data_type)| (name.to_string(), *data_type))
            .collect(),
        constraints: BTreeMap::new(),
    }
}

fn setup_users_and_orders(store: &mut SqliteStore) {
    store.initialize_database().unwrap();
    store
        .create_table("users", &specs(&[("name", DataType::String)]), true)
        .unwrap();
    store
        .create_table(
            "drink_orders",
            &specs(&[("item", DataType::String), ("user", DataType::References)]),
            true,
        )
        .unwrap();
}

#[test]
fn test_create_table_then_insert_and_select_all() {
    let mut store = SqliteStore::in_memory().unwrap();
    setup_users_and_orders(&mut store);

    let users = schema(&[("id", DataType::Integer), ("name", DataType::String)]);
    let id = store
        .insert("users", &users, &[("name".into(), "ada".into())])
        .unwrap();
    assert_eq!(id, 1);

    let rows = store.select_all("users").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], Value::from("ada"));
    assert_eq!(rows[0]["id"], Value::Integer(1));
    assert!(matches!(rows[0]["created_at"], Value::Text(_)));
}

#[test]
fn test_update_refreshes_updated_at_via_trigger() {
    let mut store = SqliteStore::in_memory().unwrap();
    setup_users_and_orders(&mut store);

    let users = schema(&[("id", DataType::Integer), ("name", DataType::String)]);
    let id = store
        .insert("users", &users, &[("name".into(), "ada".into())])
        .unwrap();

    // Plant a sentinel so the trigger's refresh is observable.
    store
        .connection()
        .execute_batch("UPDATE users SET updated_at = 'sentinel' WHERE id = 1;")
        .unwrap();
    store
        .update("users", &users, id, &[("name".into(), "lovelace".into())])
        .unwrap();

    let rows = store.select_all("users").unwrap();
    assert_eq!(rows[0]["name"], Value::from("lovelace"));
    assert_ne!(rows[0]["updated_at"], Value::from("sentinel"));
}

#[test]
fn test_select_where_joins_has_many() {
    let mut store = SqliteStore::in_memory().unwrap();
    setup_users_and_orders(&mut store);

    let users = schema(&[("id", DataType::Integer), ("name", DataType::String)]);
    let orders = schema(&[
        ("id", DataType::Integer),
        ("item", DataType::String),
        ("user_id", DataType::Integer),
    ]);

    let ada = store
        .insert("users", &users, &[("name".into(), "ada".into())])
        .unwrap();
    let grace = store
        .insert("users", &users, &[("name".into(), "grace".into())])
        .unwrap();
    store
        .insert(
            "drink_orders",
            &orders,
            &[("item".into(), "latte".into()), ("user_id".into(), ada.into())],
        )
        .unwrap();
    store
        .insert(
            "drink_orders",
            &orders,
            &[("item".into(), "mocha".into()), ("user_id".into(), grace.into())],
        )
        .unwrap();

    let (rows, target) = store
        .select_where(
            "users",
            &users,
            &["drink_orders".to_string()],
            &[("id".into(), ada.into())],
        )
        .unwrap();
    assert_eq!(target, "drink_orders");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["item"], Value::from("latte"));
}

#[test]
fn test_select_where_joins_belongs_to() {
    let mut store = SqliteStore::in_memory().unwrap();
    setup_users_and_orders(&mut store);

    let users = schema(&[("id", DataType::Integer), ("name", DataType::String)]);
    let orders = schema(&[
        ("id", DataType::Integer),
        ("item", DataType::String),
        ("user_id", DataType::Integer),
    ]);

    let ada = store
        .insert("users", &users, &[("name".into(), "ada".into())])
        .unwrap();
    let order = store
        .insert(
            "drink_orders",
            &orders,
            &[("item".into(), "latte".into()), ("user_id".into(), ada.into())],
        )
        .unwrap();

    let (rows, target) = store
        .select_where(
            "drink_orders",
            &orders,
            &["user".to_string()],
            &[("id".into(), order.into())],
        )
        .unwrap();
    assert_eq!(target, "user");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], Value::from("ada"));
}

#[test]
fn test_string_filters_are_quoted() {
    let mut store = SqliteStore::in_memory().unwrap();
    setup_users_and_orders(&mut store);

    let users = schema(&[("id", DataType::Integer), ("name", DataType::String)]);
    store
        .insert("users", &users, &[("name".into(), "O'Brien".into())])
        .unwrap();

    let (rows, _) = store
        .select_where("users", &users, &[], &[("name".into(), "O'Brien".into())])
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_dump_schema_round_trips_column_specs() {
    let mut store = SqliteStore::in_memory().unwrap();
    store.initialize_database().unwrap();
    store
        .create_table("suppliers", &specs(&[("name", DataType::String)]), true)
        .unwrap();
    store
        .create_table(
            "drinks",
            &specs(&[
                ("name", DataType::String),
                ("notes", DataType::Text),
                ("price", DataType::Integer),
                ("supplier", DataType::References),
            ]),
            true,
        )
        .unwrap();

    let artifact = store.dump_schema().unwrap();
    let drinks = &artifact.tables["drinks"];

    // Declared columns survive with their types.
    assert_eq!(drinks.columns["name"], DataType::String);
    assert_eq!(drinks.columns["notes"], DataType::Text);
    assert_eq!(drinks.columns["price"], DataType::Integer);
    // references expands to a foreign-key column plus constraint.
    assert_eq!(drinks.columns["supplier_id"], DataType::Integer);
    assert_eq!(drinks.constraints["fk_drinks_supplier"], "suppliers");
    // Injected columns are present.
    assert_eq!(drinks.columns["id"], DataType::Integer);
    assert_eq!(drinks.columns["created_at"], DataType::String);
    assert_eq!(drinks.columns["updated_at"], DataType::String);
}

#[test]
fn test_dump_schema_excludes_bookkeeping_table() {
    let mut store = SqliteStore::in_memory().unwrap();
    store.applied_migrations().unwrap();
    store
        .create_table("users", &specs(&[("name", DataType::String)]), true)
        .unwrap();

    let artifact = store.dump_schema().unwrap();
    assert!(artifact.tables.contains_key("users"));
    assert!(!artifact.tables.contains_key("schema_migrations"));
}

#[test]
fn test_migration_bookkeeping() {
    let mut store = SqliteStore::in_memory().unwrap();

    // Lazily created on first use.
    assert!(store.applied_migrations().unwrap().is_empty());

    store.mark_migration_done("20230102000000").unwrap();
    store.mark_migration_done("20230101000000").unwrap();
    assert_eq!(
        store.applied_migrations().unwrap(),
        vec!["20230101000000", "20230102000000"]
    );
}

#[test]
fn test_destroy_all() {
    let mut store = SqliteStore::in_memory().unwrap();
    setup_users_and_orders(&mut store);

    let users = schema(&[("id", DataType::Integer), ("name", DataType::String)]);
    store
        .insert("users", &users, &[("name".into(), "ada".into())])
        .unwrap();
    store.destroy_all("users").unwrap();
    assert!(store.select_all("users").unwrap().is_empty());
}

#[test]
fn test_file_backed_store_create_and_drop() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("db").join("app.sqlite3");

    let mut store = SqliteStore::open(&path).unwrap();
    store.create_database().unwrap();
    assert!(path.is_file());

    store.drop_database().unwrap();
    assert!(!path.exists());
}
