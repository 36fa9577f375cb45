//! Integration tests for related record queries
//!
//! Records hydrated from an executor are used as the starting point of
//! queries for their related records.
//!
//! Test relationships:
//! - product has_many shop (one-to-many)
//! - product has_many outlet via shop_product (many-to-many)
//! - shop belongs_to product (many-to-one)

use lifeline::{
    Executor, Model, OrmConfig, OrmError, Record, Relation, Row, Schema,
};
use sea_query::{Value, Values};
use std::cell::RefCell;

// ============================================================================
// Fixtures
// ============================================================================

/// Answers every statement with the same rows and remembers what it ran
struct RecordingExecutor {
    rows: Vec<Row>,
    statements: RefCell<Vec<(String, Vec<Value>)>>,
}

impl RecordingExecutor {
    fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            statements: RefCell::new(Vec::new()),
        }
    }

    fn last(&self) -> (String, Vec<Value>) {
        self.statements.borrow().last().cloned().unwrap()
    }
}

impl Executor for RecordingExecutor {
    fn fetch_all(&self, sql: &str, values: &Values) -> Result<Vec<Row>, OrmError> {
        self.statements
            .borrow_mut()
            .push((sql.to_string(), values.0.clone()));
        Ok(self.rows.clone())
    }
}

fn row(values: &[(&str, Value)]) -> Row {
    values
        .iter()
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}

fn schema() -> Schema {
    let mut schema = Schema::new();
    schema
        .add(
            Model::new("product")
                .with_key("id")
                .with_columns(["name", "rrp"]),
        )
        .unwrap()
        .add_relation(Relation::has_many("shop", "shop"))
        .unwrap()
        .add_relation(Relation::has_many("outlet", "shop").via("shop_product"))
        .unwrap();
    schema
        .add(
            Model::new("shop")
                .with_key("id")
                .with_columns(["name", "city", "product_id"]),
        )
        .unwrap()
        .add_relation(Relation::belongs_to("product", "product"))
        .unwrap();
    schema
}

fn config() -> OrmConfig {
    OrmConfig::default()
}

// ============================================================================
// Related queries
// ============================================================================

#[test]
fn test_related_shops_of_fetched_product() {
    let schema = schema();
    // Rows hold exactly the columns the statement selects
    let products = RecordingExecutor::new(vec![row(&[
        ("name", Value::from("chair".to_string())),
        ("rrp", Value::from(49.5f64)),
        ("id", Value::from(7i64)),
    ])]);

    let product = schema
        .query("product")
        .unwrap()
        .fetch_all_with(&products, &config())
        .unwrap()
        .remove(0);

    let (sql, _) = products.last();
    assert_eq!(
        sql,
        r#"SELECT product.name, product.rrp, product.id FROM "product" AS "product""#
    );
    assert_eq!(product.get("name"), Some(&Value::from("chair".to_string())));
    assert!(!product.is_new());

    let shops = RecordingExecutor::new(vec![
        row(&[
            ("name", Value::from("North".to_string())),
            ("city", Value::from("Berlin".to_string())),
            ("product_id", Value::from(7i64)),
            ("id", Value::from(1i64)),
        ]),
        row(&[
            ("name", Value::from("South".to_string())),
            ("city", Value::from("Munich".to_string())),
            ("product_id", Value::from(7i64)),
            ("id", Value::from(2i64)),
        ]),
    ]);
    let related = product
        .related("shop")
        .unwrap()
        .fetch_all_with(&shops, &config())
        .unwrap();

    let (sql, values) = shops.last();
    assert_eq!(
        sql,
        r#"SELECT shop.name, shop.city, shop.product_id, shop.id FROM "shop" AS "shop" WHERE "shop"."product_id" = $1"#
    );
    assert_eq!(values, vec![Value::from(7i64)]);

    assert_eq!(related.len(), 2);
    assert_eq!(related[0].model().table_name(), "shop");
    assert_eq!(related[1].get("name"), Some(&Value::from("South".to_string())));

    // And back from a fetched shop to its product
    let (sql, values) = related[0].related("product").unwrap().build_with(&config()).unwrap();
    assert!(sql.ends_with(r#"WHERE "product"."id" = $1"#));
    assert_eq!(values.0, vec![Value::from(7i64)]);
}

#[test]
fn test_explicit_projection_still_fetches_key() {
    let schema = schema();
    let products = RecordingExecutor::new(vec![row(&[
        ("name", Value::from("chair".to_string())),
        ("id", Value::from(7i64)),
    ])]);

    let product = schema
        .query("product")
        .unwrap()
        .columns(["name"])
        .fetch_all_with(&products, &config())
        .unwrap()
        .remove(0);

    let (sql, _) = products.last();
    assert_eq!(sql, r#"SELECT product.name, product.id FROM "product" AS "product""#);
    assert!(product.related("outlet").is_ok());
}

#[test]
fn test_joined_columns_keep_root_values() {
    let schema = schema();
    let products = RecordingExecutor::new(vec![row(&[
        ("name", Value::from("chair".to_string())),
        ("rrp", Value::from(49.5f64)),
        ("id", Value::from(7i64)),
        ("shop_name", Value::from("North".to_string())),
        ("shop_city", Value::from("Berlin".to_string())),
        ("shop_product_id", Value::from(7i64)),
    ])]);

    let product = schema
        .query("product")
        .unwrap()
        .with(["shop"])
        .unwrap()
        .fetch_all_with(&products, &config())
        .unwrap()
        .remove(0);

    let (sql, _) = products.last();
    assert!(sql.starts_with(
        r#"SELECT product.name, product.rrp, product.id, shop.name AS "shop_name", shop.city AS "shop_city", shop.product_id AS "shop_product_id" FROM"#
    ));
    assert_eq!(product.get("name"), Some(&Value::from("chair".to_string())));
    assert_eq!(product.get("shop_name"), Some(&Value::from("North".to_string())));
}

#[test]
fn test_related_through_link_table() {
    let schema = schema();
    let product = Record::new(&schema, schema.model("product").unwrap()).with_value("id", 7i64);

    let (sql, values) = product.related("outlet").unwrap().build_with(&config()).unwrap();

    assert!(sql.starts_with(r#"SELECT outlet.name, outlet.city, outlet.product_id FROM "shop" AS "outlet""#));
    assert!(sql.contains(
        r#"INNER JOIN "shop_product" AS "shop_product" ON outlet.id = shop_product.shop_id"#
    ));
    assert!(sql.ends_with(r#"WHERE "shop_product"."product_id" = $1"#));
    assert_eq!(values.0, vec![Value::from(7i64)]);
}

#[test]
fn test_related_parent_of_shop() {
    let schema = schema();
    let shop = Record::new(&schema, schema.model("shop").unwrap())
        .with_value("id", 1i64)
        .with_value("product_id", 7i64);

    let (sql, values) = shop.related("product").unwrap().build_with(&config()).unwrap();

    assert_eq!(
        sql,
        r#"SELECT product.name, product.rrp FROM "product" AS "product" WHERE "product"."id" = $1"#
    );
    assert_eq!(values.0, vec![Value::from(7i64)]);
}

#[test]
fn test_related_query_can_be_refined() {
    let schema = schema();
    let product = Record::new(&schema, schema.model("product").unwrap()).with_value("id", 7i64);

    let (sql, values) = product
        .related("shop")
        .unwrap()
        .columns(["city"])
        .filter(lifeline::Filter::equal("city", "Berlin"))
        .build_with(&config())
        .unwrap();

    assert!(sql.starts_with("SELECT shop.city FROM"));
    assert!(sql.ends_with(r#"WHERE "shop"."product_id" = $1 AND "shop"."city" = $2"#));
    assert_eq!(
        values.0,
        vec![Value::from(7i64), Value::from("Berlin".to_string())]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_related_of_new_record_fails() {
    let schema = schema();
    let product = Record::new(&schema, schema.model("product").unwrap());

    let err = product.related("shop").unwrap_err();
    assert_eq!(
        err,
        OrmError::NewRecord {
            model: "product".to_string(),
            column: "id".to_string(),
        }
    );
}

#[test]
fn test_related_with_null_key_fails() {
    // EDGE CASE: a NULL key counts as missing
    let schema = schema();
    let shop = Record::new(&schema, schema.model("shop").unwrap())
        .with_value("id", 1i64)
        .with_value("product_id", Value::BigInt(None));

    assert!(matches!(
        shop.related("product"),
        Err(OrmError::NewRecord { .. })
    ));
}

#[test]
fn test_execution_error_is_propagated() {
    struct Offline;

    impl Executor for Offline {
        fn fetch_all(&self, _sql: &str, _values: &Values) -> Result<Vec<Row>, OrmError> {
            Err(OrmError::Execution("offline".to_string()))
        }
    }

    let schema = schema();
    let err = schema
        .query("product")
        .unwrap()
        .fetch_all_with(&Offline, &config())
        .unwrap_err();
    assert_eq!(err, OrmError::Execution("offline".to_string()));
}
