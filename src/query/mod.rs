//! Query building and execution over a model schema.
//!
//! This module provides the query builder API for assembling SELECT statements
//! across declared relations and running them through an [`Executor`](crate::executor::Executor).
//!
//! # Architecture
//!
//! - **Column**: column resolution and projection items (`SelectItem`)
//! - **Select**: the SELECT query builder (`SelectQuery`)
//!
//! # Examples
//!
//! ```
//! use lifeline::filter::Filter;
//! use lifeline::model::Model;
//! use lifeline::relation::Relation;
//! use lifeline::schema::Schema;
//! use lifeline::config::OrmConfig;
//!
//! let mut schema = Schema::new();
//! schema
//!     .add(Model::new("product").with_key("id").with_columns(["name"]))?
//!     .add_relation(Relation::has_many("shop", "shop"))?;
//! schema.add(Model::new("shop").with_key("id").with_columns(["city"]))?;
//!
//! // Products sold in Berlin; the filter joins `shop` on its own
//! let (sql, values) = schema
//!     .query("product")?
//!     .columns(["name"])
//!     .filter(Filter::equal("shop.city", "Berlin"))
//!     .build_with(&OrmConfig::default())?;
//!
//! assert!(sql.ends_with(r#"WHERE "shop"."city" = $1"#));
//! assert_eq!(values.0.len(), 1);
//! # Ok::<(), lifeline::OrmError>(())
//! ```

// Column resolution
pub mod column;
#[doc(inline)]
pub use column::{resolve_column, SelectItem};

// SELECT query builder
pub mod select;
#[doc(inline)]
pub use select::SelectQuery;
