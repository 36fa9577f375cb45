//! Model declarations
//!
//! A [`Model`] describes one table: its name and alias, its key, the columns
//! a query projects by default, default sort rules and the relations leaving
//! it. Relation targets are referenced by registry name and looked up in the
//! [`Schema`](crate::schema::Schema) at resolution time.

use crate::error::OrmError;
use crate::relation::helpers::qualified;
use crate::relation::{OrderedKey, Relation};

mod record;
pub use record::Record;

/// A column a model exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDef {
    /// A real table column, selected as `alias.column`
    Plain(String),
    /// A raw SQL expression selected `AS alias`
    Expression { alias: String, sql: String },
}

impl ColumnDef {
    /// The name the column is addressed by in paths
    pub fn name(&self) -> &str {
        match self {
            ColumnDef::Plain(name) => name,
            ColumnDef::Expression { alias, .. } => alias,
        }
    }

    /// SQL for this column when the model is known as `table_alias`
    pub fn sql(&self, table_alias: &str) -> String {
        match self {
            ColumnDef::Plain(name) => qualified(table_alias, name),
            ColumnDef::Expression { sql, .. } => sql.clone(),
        }
    }
}

/// Sort direction of a sort rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl From<SortDirection> for sea_query::Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => sea_query::Order::Asc,
            SortDirection::Desc => sea_query::Order::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortRule {
    pub column: String,
    pub direction: SortDirection,
}

/// One member of a union model: another model and the columns it
/// contributes, as `(result alias, column path)` pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionSource {
    pub model: String,
    pub columns: Vec<(String, String)>,
}

/// A table declaration
///
/// # Example
///
/// ```
/// use lifeline::model::Model;
/// use lifeline::relation::Relation;
///
/// let mut product = Model::new("product")
///     .with_key("id")
///     .with_columns(["name", "rrp"]);
/// product.add_relation(Relation::has_many("shop", "shop")).unwrap();
///
/// assert_eq!(product.alias(), "product");
/// assert!(product.has_relation("shop"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    table_name: String,
    table_alias: Option<String>,
    key: OrderedKey,
    columns: Vec<ColumnDef>,
    relations: Vec<Relation>,
    sort_rules: Vec<SortRule>,
    union_sources: Vec<UnionSource>,
}

impl Model {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            table_alias: None,
            key: OrderedKey::new(),
            columns: Vec::new(),
            relations: Vec::new(),
            sort_rules: Vec::new(),
            union_sources: Vec::new(),
        }
    }

    /// Set the alias the model is registered and selected under
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = Some(alias.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<OrderedKey>) -> Self {
        self.key = key.into();
        self
    }

    /// Append plain columns to the default projection
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| ColumnDef::Plain(c.into())));
        self
    }

    /// Append an expression column, projected as `sql AS alias`
    pub fn with_expression(mut self, alias: impl Into<String>, sql: impl Into<String>) -> Self {
        self.columns.push(ColumnDef::Expression {
            alias: alias.into(),
            sql: sql.into(),
        });
        self
    }

    /// Append a default sort rule
    pub fn with_sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_rules.push(SortRule {
            column: column.into(),
            direction,
        });
        self
    }

    /// Select this model from a `UNION ALL` of other models instead of its table
    pub fn with_union_source<I, A, P>(mut self, model: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (A, P)>,
        A: Into<String>,
        P: Into<String>,
    {
        self.union_sources.push(UnionSource {
            model: model.into(),
            columns: columns
                .into_iter()
                .map(|(alias, path)| (alias.into(), path.into()))
                .collect(),
        });
        self
    }

    /// Declare a relation leaving this model
    ///
    /// Fails with [`OrmError::DuplicateRelation`] if the name is taken; the
    /// first declaration stays in place.
    pub fn add_relation(&mut self, relation: Relation) -> Result<&mut Self, OrmError> {
        if self.has_relation(relation.name()) {
            return Err(OrmError::DuplicateRelation {
                name: relation.name().to_string(),
                model: self.alias().to_string(),
            });
        }

        log::debug!(
            "Declared relation '{}' on '{}' -> '{}'",
            relation.name(),
            self.alias(),
            relation.target()
        );

        let relation = relation.with_subject(self.alias().to_string());
        self.relations.push(relation);
        Ok(self)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The table alias, defaulting to the table name
    pub fn alias(&self) -> &str {
        self.table_alias.as_deref().unwrap_or(&self.table_name)
    }

    pub fn key(&self) -> &OrderedKey {
        &self.key
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Whether `name` can be selected or filtered on: a declared column,
    /// an expression alias or a key column
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some() || self.key.contains(name)
    }

    /// Relations in declaration order
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name() == name)
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relation(name).is_some()
    }

    pub fn sort_rules(&self) -> &[SortRule] {
        &self.sort_rules
    }

    pub fn union_sources(&self) -> &[UnionSource] {
        &self.union_sources
    }

    pub fn is_union(&self) -> bool {
        !self.union_sources.is_empty()
    }
}
