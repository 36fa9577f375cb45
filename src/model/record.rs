//! Hydrated result rows

use crate::error::OrmError;
use crate::executor::Row;
use crate::filter::Predicate;
use crate::model::Model;
use crate::query::column::qualified_col;
use crate::query::SelectQuery;
use crate::schema::Schema;
use sea_query::{ExprTrait, Value};

/// One row of a model, keyed by result column name
#[derive(Debug, Clone)]
pub struct Record<'s> {
    schema: &'s Schema,
    model: &'s Model,
    values: Row,
}

impl<'s> Record<'s> {
    /// An empty record, as if newly created
    pub fn new(schema: &'s Schema, model: &'s Model) -> Self {
        Self::from_row(schema, model, Row::new())
    }

    /// Hydrate from a result row, keeping every column under its result name
    ///
    /// Rows of [`SelectQuery::fetch_all`] carry root columns by name and
    /// joined columns as `{prefix}_{column}`.
    pub fn from_row(schema: &'s Schema, model: &'s Model, row: Row) -> Self {
        Self {
            schema,
            model,
            values: row,
        }
    }

    pub fn with_value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn values(&self) -> &Row {
        &self.values
    }

    pub fn model(&self) -> &'s Model {
        self.model
    }

    /// Whether any key column is missing or NULL
    pub fn is_new(&self) -> bool {
        self.model.key().is_empty()
            || self
                .model
                .key()
                .iter()
                .any(|column| self.present(column).is_none())
    }

    fn present(&self, column: &str) -> Option<&Value> {
        self.values.get(column).filter(|value| !is_null(value))
    }

    /// Query the records related to this one through relation `name`
    ///
    /// The query is rooted at the relation target, aliased by the relation
    /// name, and constrained to this record's key values. Through-table
    /// relations join the link table.
    ///
    /// Fails with [`OrmError::NewRecord`] if a column the relation joins on
    /// has no value.
    pub fn related(&self, name: &str) -> Result<SelectQuery<'s>, OrmError> {
        let relation = self
            .model
            .relation(name)
            .ok_or_else(|| OrmError::UnknownRelation {
                name: name.to_string(),
                on_table: self.model.alias().to_string(),
            })?;
        let target = self.schema.model(relation.target())?;
        let joins = relation.resolve(self.model, self.model.alias(), target)?;

        let first = joins
            .first()
            .ok_or_else(|| OrmError::InvalidPath(name.to_string()))?;

        let mut constraints = Vec::with_capacity(first.pairs.len());
        for pair in &first.pairs {
            let value = self
                .present(&pair.subject_column)
                .ok_or_else(|| OrmError::NewRecord {
                    model: self.model.alias().to_string(),
                    column: pair.subject_column.clone(),
                })?;
            constraints.push(Predicate::Leaf(
                qualified_col(&first.alias, &pair.target_column).eq(value.clone()),
            ));
        }

        let mut query = SelectQuery::for_model(self.schema, target).aliased(relation.name())?;

        // Each intermediate table is joined on the conditions of the hop leaving it
        for hops in joins.windows(2).rev() {
            query = query.link(&hops[0], hops[1].conditions());
        }

        Ok(constraints
            .into_iter()
            .fold(query, |query, predicate| query.constrain(predicate)))
    }
}

fn is_null(value: &Value) -> bool {
    *value == value.as_null()
}
