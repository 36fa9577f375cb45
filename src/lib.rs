//! # Lifeline
//!
//! Relation-graph SELECT assembly on top of SeaQuery.
//!
//! Declare models and the relations between them once in a [`Schema`], then
//! build queries that join related tables by dotted path (`"shop.country.name"`),
//! filter across relations and project related columns without writing SQL by
//! hand. Statements are rendered by SeaQuery for PostgreSQL, MySQL or SQLite and
//! can be run through any [`Executor`].

pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod model;
pub mod query;
pub mod relation;
pub mod schema;


pub use config::{Dialect, OrmConfig};
pub use error::OrmError;
pub use executor::{Executor, Row};
pub use filter::{ChainKind, Filter, Operator};
pub use model::{Model, Record, SortDirection};
pub use query::SelectQuery;
pub use relation::{JoinKind, OrderedKey, Relation, RelationType};
pub use schema::Schema;
