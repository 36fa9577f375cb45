//! Boolean filter trees
//!
//! A [`Filter`] is either a chain (`and`, `or`, `not`, `xor`) over child
//! filters or a condition comparing a column path with a value. Trees can be
//! built in code or deserialized from JSON:
//!
//! ```
//! use lifeline::filter::Filter;
//!
//! let filter: Filter = serde_json::from_str(
//!     r#"{"chain": "or", "filters": [
//!         {"column": "shop.city", "operator": "=", "value": "Berlin"},
//!         {"column": "rrp", "operator": "<", "value": 10}
//!     ]}"#,
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     filter,
//!     Filter::any([Filter::equal("shop.city", "Berlin"), Filter::less_than("rrp", 10)])
//! );
//! ```
//!
//! Lowering a tree into SQL lives in [`lowering`].

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod lowering;
pub use lowering::{assemble, Predicate};

/// Boolean operator of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    And,
    Or,
    Not,
    Xor,
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainKind::And => "and",
            ChainKind::Or => "or",
            ChainKind::Not => "not",
            ChainKind::Xor => "xor",
        };
        write!(f, "{}", name)
    }
}

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterChain {
    pub chain: ChainKind,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Dotted column path relative to the query root
    pub column: String,
    pub operator: Operator,
    /// Scalar, `null` or a list of scalars
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Chain(FilterChain),
    Condition(FilterCondition),
}

impl Filter {
    pub fn chain<I>(kind: ChainKind, filters: I) -> Self
    where
        I: IntoIterator<Item = Filter>,
    {
        Filter::Chain(FilterChain {
            chain: kind,
            filters: filters.into_iter().collect(),
        })
    }

    /// An empty `and` chain, matching everything
    pub fn match_all() -> Self {
        Self::all([])
    }

    pub fn all<I: IntoIterator<Item = Filter>>(filters: I) -> Self {
        Self::chain(ChainKind::And, filters)
    }

    pub fn any<I: IntoIterator<Item = Filter>>(filters: I) -> Self {
        Self::chain(ChainKind::Or, filters)
    }

    pub fn none<I: IntoIterator<Item = Filter>>(filters: I) -> Self {
        Self::chain(ChainKind::Not, filters)
    }

    pub fn condition(
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Filter::Condition(FilterCondition {
            column: column.into(),
            operator,
            value: value.into(),
        })
    }

    pub fn equal(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::condition(column, Operator::Eq, value)
    }

    pub fn unequal(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::condition(column, Operator::Ne, value)
    }

    pub fn less_than(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::condition(column, Operator::Lt, value)
    }

    pub fn less_than_or_equal(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::condition(column, Operator::Le, value)
    }

    pub fn greater_than(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::condition(column, Operator::Gt, value)
    }

    pub fn greater_than_or_equal(column: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::condition(column, Operator::Ge, value)
    }

    /// Whether this is an empty `and` chain
    pub fn is_match_all(&self) -> bool {
        matches!(self, Filter::Chain(FilterChain { chain: ChainKind::And, filters }) if filters.is_empty())
    }

    /// Append `filter` to this chain, or wrap both in an `and` chain
    pub fn and(self, filter: Filter) -> Self {
        match self {
            Filter::Chain(mut chain) if chain.chain == ChainKind::And => {
                chain.filters.push(filter);
                Filter::Chain(chain)
            }
            other => Self::all([other, filter]),
        }
    }
}
