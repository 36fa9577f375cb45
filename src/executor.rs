//! `Executor` Module
//!
//! Provides the `Executor` trait that hands assembled statements to a database
//! driver. The crate itself ships no driver; applications implement the trait
//! over whatever client they use.

use crate::error::OrmError;
use sea_query::{Value, Values};
use std::collections::HashMap;

/// One result row keyed by result column name
pub type Row = HashMap<String, Value>;

/// Trait for running assembled SELECT statements
///
/// # Examples
///
/// ```
/// use lifeline::executor::{Executor, Row};
/// use lifeline::OrmError;
/// use sea_query::Values;
///
/// struct Empty;
///
/// impl Executor for Empty {
///     fn fetch_all(&self, _sql: &str, _values: &Values) -> Result<Vec<Row>, OrmError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait Executor {
    /// Run `sql` with its bind `values` and return every row
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Execution`] if the driver fails.
    fn fetch_all(&self, sql: &str, values: &Values) -> Result<Vec<Row>, OrmError>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn fetch_all(&self, sql: &str, values: &Values) -> Result<Vec<Row>, OrmError> {
        (**self).fetch_all(sql, values)
    }
}
