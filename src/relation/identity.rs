//! Ordered keys for single and compound column references
//!
//! Primary, candidate and foreign keys are all represented by [`OrderedKey`]:
//! a single-column key is a one-element list, a compound key keeps its
//! columns in declaration order. Pairing of foreign and candidate key columns
//! is positional, so the order is significant.

use std::fmt;

/// An ordered list of column names forming a (possibly compound) key
///
/// # Example
///
/// ```
/// use lifeline::relation::OrderedKey;
///
/// let id = OrderedKey::from("id");
/// assert_eq!(id.arity(), 1);
///
/// let compound = OrderedKey::from(["name", "vendor"]);
/// assert_eq!(compound.columns(), &["name".to_string(), "vendor".to_string()]);
///
/// assert!(OrderedKey::from("").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OrderedKey(Vec<String>);

impl OrderedKey {
    /// An empty key (no columns)
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of columns in this key
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.iter().any(|c| c == column)
    }

    /// Derive a key whose columns are `{prefix}_{column}` for every column
    ///
    /// This is how default foreign keys are named after the owning table.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self(self.0.iter().map(|c| format!("{}_{}", prefix, c)).collect())
    }
}

impl fmt::Display for OrderedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

impl From<&str> for OrderedKey {
    fn from(column: &str) -> Self {
        if column.is_empty() {
            Self::new()
        } else {
            Self(vec![column.to_string()])
        }
    }
}

impl From<String> for OrderedKey {
    fn from(column: String) -> Self {
        Self::from(column.as_str())
    }
}

impl From<Vec<String>> for OrderedKey {
    fn from(columns: Vec<String>) -> Self {
        Self(columns.into_iter().filter(|c| !c.is_empty()).collect())
    }
}

impl From<Vec<&str>> for OrderedKey {
    fn from(columns: Vec<&str>) -> Self {
        Self::from(columns.as_slice())
    }
}

impl From<&[&str]> for OrderedKey {
    fn from(columns: &[&str]) -> Self {
        Self(
            columns
                .iter()
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string())
                .collect(),
        )
    }
}

impl<const N: usize> From<[&str; N]> for OrderedKey {
    fn from(columns: [&str; N]) -> Self {
        Self::from(columns.as_slice())
    }
}

impl<'a> IntoIterator for &'a OrderedKey {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
