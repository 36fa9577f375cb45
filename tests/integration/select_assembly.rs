//! Integration tests for SELECT assembly across relations
//!
//! These tests validate join resolution, projection and join ordering of
//! assembled statements, rendered for PostgreSQL.
//!
//! Test relationships:
//! - product has_many shop (one-to-many)
//! - product has_many shop via shop_product (many-to-many)
//! - shop belongs_to country (many-to-one)

use lifeline::{
    Filter, JoinKind, Model, OrmConfig, OrmError, OrderedKey, Relation, Schema, SelectQuery,
};
use sea_query::PostgresQueryBuilder;

// ============================================================================
// Fixtures
// ============================================================================

fn product() -> Model {
    Model::new("product")
        .with_key("id")
        .with_columns(["name", "rrp"])
}

fn shop() -> Model {
    Model::new("shop").with_columns(["name", "city"])
}

fn schema_with(relations: Vec<Relation>) -> Schema {
    let mut schema = Schema::new();
    let product = schema.add(product()).unwrap();
    for relation in relations {
        product.add_relation(relation).unwrap();
    }

    let shop = schema.add(shop().with_key("id")).unwrap();
    shop.add_relation(Relation::belongs_to("country", "country"))
        .unwrap();
    schema
        .add(Model::new("country").with_key("id").with_columns(["name"]))
        .unwrap();
    schema
}

fn sql(query: &SelectQuery<'_>) -> String {
    query
        .to_statement_with(&OrmConfig::default())
        .unwrap()
        .to_string(PostgresQueryBuilder)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_product_with_shop() {
    let mut schema = Schema::new();
    schema
        .add(product())
        .unwrap()
        .add_relation(Relation::has_many("shop", "shop"))
        .unwrap();
    schema.add(shop()).unwrap();

    let query = schema.query("product").unwrap().with(["shop"]).unwrap();

    assert_eq!(
        sql(&query),
        r#"SELECT product.name, product.rrp, shop.name, shop.city FROM "product" AS "product" INNER JOIN "shop" AS "shop" ON shop.product_id = product.id"#
    );
}

#[test]
fn test_product_with_shop_via_link_table() {
    let schema = schema_with(vec![Relation::has_many("shop", "shop").via("shop_product")]);
    let query = schema.query("product").unwrap().with(["shop"]).unwrap();

    assert!(sql(&query).ends_with(
        r#"INNER JOIN "shop_product" AS "shop_product" ON shop_product.product_id = product.id INNER JOIN "shop" AS "shop" ON shop.id = shop_product.shop_id"#
    ));

    // The link table contributes no columns
    assert!(sql(&query).starts_with(
        "SELECT product.name, product.rrp, shop.name, shop.city FROM"
    ));
}

#[test]
fn test_via_with_one_explicit_target_key() {
    // EDGE CASE: only the target foreign key is set, the target candidate key keeps its default
    let schema = schema_with(vec![Relation::has_many("shop", "shop")
        .via("shop_product")
        .with_target_foreign_key("store_id")]);
    let joins = schema
        .query("product")
        .unwrap()
        .with(["shop"])
        .unwrap()
        .resolved_joins()
        .unwrap();

    assert_eq!(joins[1].conditions(), vec!["shop.id = shop_product.store_id"]);
}

#[test]
fn test_duplicate_relation_keeps_first() {
    let mut schema = Schema::new();
    let product = schema.add(product()).unwrap();
    product
        .add_relation(Relation::has_many("shop", "shop"))
        .unwrap();

    let err = product
        .add_relation(Relation::has_many("shop", "shop").via("shop_product"))
        .unwrap_err();

    assert!(matches!(err, OrmError::DuplicateRelation { .. }));
    assert_eq!(product.relation("shop").unwrap().via_table(), None);
}

#[test]
fn test_two_relations_to_the_same_model() {
    let schema = schema_with(vec![
        Relation::has_many("retail", "shop"),
        Relation::has_many("digital", "shop").with_foreign_key("online_product_id"),
    ]);
    let query = schema
        .query("product")
        .unwrap()
        .with(["retail", "digital"])
        .unwrap();

    let sql = sql(&query);
    assert!(sql.contains(r#"INNER JOIN "shop" AS "retail" ON retail.product_id = product.id"#));
    assert!(sql.contains(r#"INNER JOIN "shop" AS "digital" ON digital.online_product_id = product.id"#));
    assert!(sql.contains("retail.name, retail.city, digital.name, digital.city"));
}

#[test]
fn test_with_is_idempotent() {
    let schema = schema_with(vec![Relation::has_many("shop", "shop")]);

    let once = schema.query("product").unwrap().with(["shop.country"]).unwrap();
    let twice = schema
        .query("product")
        .unwrap()
        .with(["shop", "shop.country", "shop.country"])
        .unwrap();

    assert_eq!(once.resolved_joins().unwrap(), twice.resolved_joins().unwrap());
    assert_eq!(sql(&once), sql(&twice));
}

#[test]
fn test_joins_follow_registration_order() {
    let schema = schema_with(vec![
        Relation::has_many("shop", "shop"),
        Relation::has_many("outlet", "shop"),
    ]);
    let query = schema
        .query("product")
        .unwrap()
        .with(["outlet"])
        .unwrap()
        .columns(["name", "shop.country.name"]);

    let aliases: Vec<String> = query
        .resolved_joins()
        .unwrap()
        .into_iter()
        .map(|join| join.alias)
        .collect();
    assert_eq!(aliases, vec!["outlet", "shop", "country"]);
}

#[test]
fn test_compound_key() {
    let mut schema = Schema::new();
    schema
        .add(
            Model::new("product")
                .with_key(OrderedKey::from(["name", "vendor"]))
                .with_columns(["rrp"]),
        )
        .unwrap()
        .add_relation(Relation::has_many("shop", "shop"))
        .unwrap();
    schema.add(shop()).unwrap();

    let sql = sql(&schema.query("product").unwrap().with(["shop"]).unwrap());
    assert!(sql.contains("shop.product_name = product.name"));
    assert!(sql.contains("shop.product_vendor = product.vendor"));
}

#[test]
fn test_missing_key_fails_on_with() {
    let mut schema = Schema::new();
    schema
        .add(Model::new("product").with_columns(["name"]))
        .unwrap()
        .add_relation(Relation::has_many("shop", "shop"))
        .unwrap();
    schema.add(shop()).unwrap();

    let err = schema.query("product").unwrap().with(["shop"]).unwrap_err();
    assert!(matches!(err, OrmError::NoCandidateKey { .. }));
}

#[test]
fn test_key_cardinality_mismatch_fails_on_with() {
    let schema = schema_with(vec![
        Relation::has_many("shop", "shop").with_foreign_key(["product_name", "product_vendor"]),
    ]);

    let err = schema.query("product").unwrap().with(["shop"]).unwrap_err();
    assert!(matches!(err, OrmError::KeyCardinalityMismatch { .. }));
}

#[test]
fn test_unknown_relation_fails_on_with() {
    let schema = schema_with(vec![Relation::has_many("shop", "shop")]);

    let err = schema.query("product").unwrap().with(["shop.owner"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Can't join relation 'owner' on table 'shop': relation not found"
    );
}

#[test]
fn test_unknown_column_fails_on_assembly() {
    let schema = schema_with(vec![Relation::has_many("shop", "shop")]);
    let query = schema.query("product").unwrap().columns(["shop.price"]);

    assert!(matches!(
        query.to_statement_with(&OrmConfig::default()),
        Err(OrmError::ColumnNotFound { .. })
    ));
}

#[test]
fn test_self_prefixed_column_paths() {
    let schema = schema_with(vec![Relation::has_many("shop", "shop")]);
    let query = schema
        .query("product")
        .unwrap()
        .columns(["product.name", "product.shop.city"]);

    assert_eq!(
        sql(&query),
        r#"SELECT product.name, shop.city FROM "product" AS "product" INNER JOIN "shop" AS "shop" ON shop.product_id = product.id"#
    );
}

#[test]
fn test_wildcard_filter_is_order_independent() {
    let schema = schema_with(vec![Relation::has_many("shop", "shop")]);
    let wildcard = Filter::equal("shop.name", "*");

    let filter_first = schema
        .query("product")
        .unwrap()
        .filter(wildcard.clone())
        .with(["shop"])
        .unwrap();
    let with_first = schema
        .query("product")
        .unwrap()
        .with(["shop"])
        .unwrap()
        .filter(wildcard.clone());

    assert_eq!(sql(&filter_first), sql(&with_first));
    assert!(sql(&with_first).ends_with("WHERE TRUE"));

    // Without with() the wildcard alone joins nothing
    let alone = schema.query("product").unwrap().filter(wildcard);
    assert!(!sql(&alone).contains("JOIN"));
}

#[test]
fn test_filter_join_adds_relation_columns() {
    let schema = schema_with(vec![Relation::has_many("shop", "shop")]);
    let query = schema
        .query("product")
        .unwrap()
        .filter(Filter::equal("shop.city", "Berlin"));

    assert_eq!(
        sql(&query),
        r#"SELECT product.name, product.rrp, shop.name, shop.city FROM "product" AS "product" INNER JOIN "shop" AS "shop" ON shop.product_id = product.id WHERE "shop"."city" = 'Berlin'"#
    );
}

#[test]
fn test_queries_do_not_share_registrations() {
    let schema = schema_with(vec![Relation::has_many("shop", "shop")]);

    let joined = schema.query("product").unwrap().with(["shop"]).unwrap();
    let plain = schema.query("product").unwrap();

    assert!(sql(&joined).contains("JOIN"));
    assert!(!sql(&plain).contains("JOIN"));
}

#[test]
fn test_left_join_relation() {
    let schema = schema_with(vec![Relation::has_one("shop", "shop").with_join_type(JoinKind::Left)]);
    let query = schema.query("product").unwrap().with(["shop"]).unwrap();

    assert!(sql(&query).contains(r#"LEFT JOIN "shop" AS "shop""#));
}
