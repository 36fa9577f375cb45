//! Model registry
//!
//! Relations name their target by registry name, so the relation graph may
//! contain cycles (`product -> shop -> product`). The [`Schema`] owns every
//! model and is only read while queries are assembled.

use crate::error::OrmError;
use crate::model::Model;
use crate::query::SelectQuery;
use std::collections::HashMap;

/// Registry of models keyed by their alias
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: HashMap<String, Model>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its alias
    pub fn add(&mut self, model: Model) -> Result<&mut Model, OrmError> {
        let name = model.alias().to_string();
        if self.models.contains_key(&name) {
            return Err(OrmError::DuplicateModel(name));
        }

        log::debug!("Registered model '{}' (table '{}')", name, model.table_name());
        Ok(self.models.entry(name).or_insert(model))
    }

    pub fn model(&self, name: &str) -> Result<&Model, OrmError> {
        self.models
            .get(name)
            .ok_or_else(|| OrmError::UnknownModel(name.to_string()))
    }

    pub fn model_mut(&mut self, name: &str) -> Result<&mut Model, OrmError> {
        self.models
            .get_mut(name)
            .ok_or_else(|| OrmError::UnknownModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The target model of relation `relation` on model `model`
    pub fn related(&self, model: &str, relation: &str) -> Result<&Model, OrmError> {
        let subject = self.model(model)?;
        let relation = subject
            .relation(relation)
            .ok_or_else(|| OrmError::UnknownRelation {
                name: relation.to_string(),
                on_table: subject.alias().to_string(),
            })?;

        self.model(relation.target())
    }

    /// Start a query rooted at `model`
    pub fn query(&self, model: &str) -> Result<SelectQuery<'_>, OrmError> {
        SelectQuery::new(self, model)
    }
}
