//! Column resolution
//!
//! Turns a column name on a model, known in the query under some alias, into
//! the SQL fragment that selects or filters it.

use crate::error::OrmError;
use crate::model::{ColumnDef, Model};
use crate::relation::helpers::qualified;
use sea_query::{Alias, Expr};

/// One projected column: a SQL fragment plus an optional result alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub expr: String,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            alias: None,
        }
    }

    pub fn aliased(expr: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            alias: Some(alias.into()),
        }
    }
}

/// Resolve `column` on `model` (known as `table_alias`) to its SQL fragment
///
/// Plain and key columns resolve to `table_alias.column`, expression columns
/// to their raw SQL.
pub fn resolve_column(model: &Model, table_alias: &str, column: &str) -> Result<String, OrmError> {
    match model.column(column) {
        Some(def) => Ok(def.sql(table_alias)),
        None if model.key().contains(column) => Ok(qualified(table_alias, column)),
        None => Err(column_not_found(model, table_alias, column)),
    }
}

/// Resolve `column` into an expression conditions can bind values against
///
/// Plain and key columns become `"table_alias"."column"` references,
/// expression columns stay raw SQL.
pub fn column_expr(model: &Model, table_alias: &str, column: &str) -> Result<Expr, OrmError> {
    match model.column(column) {
        Some(ColumnDef::Expression { sql, .. }) => Ok(Expr::cust(sql.clone())),
        Some(ColumnDef::Plain(_)) => Ok(qualified_col(table_alias, column)),
        None if model.key().contains(column) => Ok(qualified_col(table_alias, column)),
        None => Err(column_not_found(model, table_alias, column)),
    }
}

pub fn qualified_col(table_alias: &str, column: &str) -> Expr {
    Expr::col((Alias::new(table_alias), Alias::new(column)))
}

fn column_not_found(model: &Model, table_alias: &str, column: &str) -> OrmError {
    OrmError::ColumnNotFound {
        column: column.to_string(),
        table: table_alias.to_string(),
        model: model.alias().to_string(),
    }
}

/// Whether `column` names a column, expression or key column of `model`
pub fn has_column(model: &Model, column: &str) -> bool {
    model.has_column(column)
}

/// Resolve `column` into a projection item
///
/// An explicit alias always wins. Otherwise expression columns are aliased by
/// their name and, with a `prefix`, plain columns are aliased `{prefix}_{column}`.
pub fn select_item(
    model: &Model,
    table_alias: &str,
    column: &str,
    explicit_alias: Option<&str>,
    prefix: Option<&str>,
) -> Result<SelectItem, OrmError> {
    let expr = resolve_column(model, table_alias, column)?;
    let is_expression = matches!(model.column(column), Some(ColumnDef::Expression { .. }));

    let alias = match (explicit_alias, prefix) {
        (Some(alias), _) => Some(alias.to_string()),
        (None, Some(prefix)) => Some(format!("{}_{}", prefix, column)),
        (None, None) if is_expression => Some(column.to_string()),
        (None, None) => None,
    };

    Ok(SelectItem { expr, alias })
}

/// The default projection of `model`: every declared column, in order
pub fn auto_projection(model: &Model, table_alias: &str, prefix: Option<&str>) -> Vec<SelectItem> {
    model
        .columns()
        .iter()
        .map(|def| {
            let alias = match (prefix, def) {
                (Some(prefix), _) => Some(format!("{}_{}", prefix, def.name())),
                (None, ColumnDef::Expression { alias, .. }) => Some(alias.clone()),
                (None, ColumnDef::Plain(_)) => None,
            };
            SelectItem {
                expr: def.sql(table_alias),
                alias,
            }
        })
        .collect()
}
