//! Lowering filter trees into SQL predicates
//!
//! [`assemble`] walks a [`Filter`] and produces a [`Predicate`] tree:
//!
//! - `and` / `or` / `not` chains become `ALL` / `ANY` / `NOT` groups; `xor` is
//!   rejected. Children that lower to nothing are dropped, nested groups with
//!   the same operator are flattened and groups left with a single child
//!   collapse into that child.
//! - Conditions register the joins their column path needs, then lower by
//!   operator and value shape:
//!
//! | operator | value              | SQL                                          |
//! |----------|--------------------|----------------------------------------------|
//! | `=`      | list               | `col IN ($1, ..)`                            |
//! | `!=`     | list               | `col NOT IN ($1, ..) OR col IS NULL`         |
//! | `=`      | `"*"`              | `TRUE` (no join registered)                  |
//! | `!=`     | `"*"`              | `FALSE` (no join registered)                 |
//! | `=`      | `"a*"`             | `col LIKE $1` bound to `a%`                  |
//! | `!=`     | `"a*"`             | `col NOT LIKE $1 OR col IS NULL`             |
//! | `=`      | `null`             | `col IS NULL`                                |
//! | `!=`     | `null`             | `col IS NOT NULL`                            |
//! | `!=`     | scalar             | `col <> $1 OR col IS NULL`                   |
//! | other    | scalar             | `col {op} $1`                                |
//!
//! An empty list lowers to `FALSE` for `=` and `TRUE` for `!=`. Leaves are
//! SeaQuery expressions, so placeholders follow the backend the statement is
//! built for (`$n` on PostgreSQL, `?` elsewhere).

use crate::error::OrmError;
use crate::filter::{ChainKind, Filter, FilterCondition, Operator};
use crate::relation::EagerLoad;
use sea_query::{Condition, Expr, ExprTrait, Value};

/// Boolean operator of a predicate group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    All,
    Any,
    Not,
}

/// A lowered filter: column expressions with bound values, grouped by boolean
/// operators
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Group { op: BoolOp, items: Vec<Predicate> },
    Leaf(Expr),
}

impl Predicate {
    fn fixed(sql: &'static str) -> Self {
        Predicate::Leaf(Expr::cust(sql))
    }

    /// Convert into a SeaQuery condition
    pub fn into_condition(self) -> Condition {
        match self {
            Predicate::Group { op, items } => {
                let condition = match op {
                    BoolOp::All | BoolOp::Not => Condition::all(),
                    BoolOp::Any => Condition::any(),
                };
                let condition = items
                    .into_iter()
                    .fold(condition, |condition, item| item.add_to(condition));

                if op == BoolOp::Not {
                    condition.not()
                } else {
                    condition
                }
            }
            leaf => leaf.add_to(Condition::all()),
        }
    }

    fn add_to(self, condition: Condition) -> Condition {
        match self {
            Predicate::Leaf(expr) => condition.add(expr),
            group => condition.add(group.into_condition()),
        }
    }
}

/// Lower `filter` against the query's path registry
///
/// Returns `None` when the filter has no effect (an empty chain).
pub fn assemble(filter: &Filter, eager: &mut EagerLoad<'_>) -> Result<Option<Predicate>, OrmError> {
    match filter {
        Filter::Chain(chain) => {
            let op = match chain.chain {
                ChainKind::And => BoolOp::All,
                ChainKind::Or => BoolOp::Any,
                ChainKind::Not => BoolOp::Not,
                ChainKind::Xor => return Err(OrmError::UnsupportedFilter(chain.chain.to_string())),
            };

            let mut items = Vec::with_capacity(chain.filters.len());
            for child in &chain.filters {
                match assemble(child, eager)? {
                    Some(Predicate::Group {
                        op: child_op,
                        items: nested,
                    }) if child_op == op && op != BoolOp::Not => items.extend(nested),
                    Some(predicate) => items.push(predicate),
                    None => {}
                }
            }

            Ok(match items.len() {
                0 => None,
                1 if op != BoolOp::Not => items.pop(),
                _ => Some(Predicate::Group { op, items }),
            })
        }
        Filter::Condition(condition) => lower_condition(condition, eager).map(Some),
    }
}

fn lower_condition(condition: &FilterCondition, eager: &mut EagerLoad<'_>) -> Result<Predicate, OrmError> {
    let operator = condition.operator;
    let wildcard_only = matches!(operator, Operator::Eq | Operator::Ne)
        && condition.value.as_str() == Some("*");

    let column = eager.resolve_column_expr(&condition.column, !wildcard_only)?;

    if wildcard_only {
        return Ok(Predicate::fixed(if operator == Operator::Eq { "TRUE" } else { "FALSE" }));
    }

    let expr = match &condition.value {
        serde_json::Value::Array(items) => {
            if !matches!(operator, Operator::Eq | Operator::Ne) {
                return Err(OrmError::UnsupportedArrayOperator {
                    column: condition.column.clone(),
                    operator: operator.to_string(),
                });
            }

            if items.is_empty() {
                return Ok(Predicate::fixed(if operator == Operator::Eq { "FALSE" } else { "TRUE" }));
            }

            let values = items
                .iter()
                .map(|item| bind_value(&condition.column, item))
                .collect::<Result<Vec<_>, _>>()?;

            if operator == Operator::Eq {
                column.is_in(values)
            } else {
                column.clone().is_not_in(values).or(column.is_null())
            }
        }
        serde_json::Value::Null => match operator {
            Operator::Eq => column.is_null(),
            Operator::Ne => column.is_not_null(),
            _ => return Err(unsupported_value(&condition.column, &condition.value)),
        },
        serde_json::Value::String(text)
            if text.contains('*') && matches!(operator, Operator::Eq | Operator::Ne) =>
        {
            let pattern = text.replace('*', "%");
            if operator == Operator::Eq {
                column.like(pattern)
            } else {
                column.clone().not_like(pattern).or(column.is_null())
            }
        }
        scalar => {
            let value = bind_value(&condition.column, scalar)?;
            match operator {
                Operator::Eq => column.eq(value),
                Operator::Ne => column.clone().ne(value).or(column.is_null()),
                Operator::Lt => column.lt(value),
                Operator::Le => column.lte(value),
                Operator::Gt => column.gt(value),
                Operator::Ge => column.gte(value),
            }
        }
    };

    Ok(Predicate::Leaf(expr))
}

/// Convert a scalar JSON value into a bind value
pub fn bind_value(column: &str, value: &serde_json::Value) -> Result<Value, OrmError> {
    match value {
        serde_json::Value::Bool(b) => Ok(Value::from(*b)),
        serde_json::Value::String(s) => Ok(Value::from(s.clone())),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::from(f))
            } else {
                Err(unsupported_value(column, value))
            }
        }
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            Err(unsupported_value(column, value))
        }
    }
}

fn unsupported_value(column: &str, value: &serde_json::Value) -> OrmError {
    OrmError::UnsupportedFilterValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}
