//! Helper functions for relationship operations.

/// Build the SQL fragment for one join condition
///
/// Creates a table-qualified column comparison: `target_alias.target_column = subject_alias.subject_column`.
/// Names are emitted verbatim, so they must already be validated identifiers.
///
/// # Example
///
/// ```
/// use lifeline::relation::helpers::join_condition;
///
/// let condition = join_condition("shop", "product_id", "product", "id");
/// assert_eq!(condition, "shop.product_id = product.id");
/// ```
pub fn join_condition(
    target_alias: &str,
    target_column: &str,
    subject_alias: &str,
    subject_column: &str,
) -> String {
    format!(
        "{}.{} = {}.{}",
        target_alias, target_column, subject_alias, subject_column
    )
}

/// Qualify a column with the alias it is selected from
pub fn qualified(alias: &str, column: &str) -> String {
    format!("{}.{}", alias, column)
}
