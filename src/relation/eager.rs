//! Per-query registry of joined relation paths
//!
//! A dotted path such as `shop.country` walks relations starting at the query
//! root. Registering it resolves every hop once and records the resulting
//! joins in registration order; registering the same path (or a prefix of an
//! already registered path) again reuses the recorded hops. Column paths
//! (`shop.country.name`) register their relation prefix and resolve the last
//! segment as a column on the model reached.
//!
//! Each [`SelectQuery`](crate::query::SelectQuery) owns one registry, so two
//! queries over the same schema never share join state.

use crate::error::OrmError;
use crate::model::Model;
use crate::query::column::{self, SelectItem};
use crate::relation::def::{Relation, ResolvedJoin};
use crate::schema::Schema;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_query::Expr;

static PATH_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("path segment pattern is valid"));

/// A registered relation path
#[derive(Debug, Clone)]
pub struct Eager<'s> {
    /// Normalized dotted path, relative to the query root
    pub path: String,
    pub relation: &'s Relation,
    pub target: &'s Model,
    /// Alias of the model this hop starts from
    pub subject_alias: String,
    /// One join for direct relations, two for through-table relations
    pub joins: Vec<ResolvedJoin>,
}

impl Eager<'_> {
    /// Alias the relation target is known under in the query
    pub fn alias(&self) -> &str {
        self.relation.name()
    }

    /// Result alias prefix for auto-projected columns, if it differs from the
    /// relation name
    pub fn projection_prefix(&self) -> Option<&str> {
        projection_prefix(self.relation)
    }
}

fn projection_prefix(relation: &Relation) -> Option<&str> {
    let prefix = relation.column_prefix();
    (prefix != relation.name()).then_some(prefix)
}

/// Ordered set of relation paths registered for one query
#[derive(Debug, Clone)]
pub struct EagerLoad<'s> {
    schema: &'s Schema,
    root: &'s Model,
    root_alias: String,
    entries: Vec<Eager<'s>>,
}

impl<'s> EagerLoad<'s> {
    pub fn new(schema: &'s Schema, root: &'s Model, root_alias: impl Into<String>) -> Self {
        Self {
            schema,
            root,
            root_alias: root_alias.into(),
            entries: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn root(&self) -> &'s Model {
        self.root
    }

    pub fn root_alias(&self) -> &str {
        &self.root_alias
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered paths in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, Eager<'s>> {
        self.entries.iter()
    }

    pub fn get(&self, path: &str) -> Option<&Eager<'s>> {
        self.position(path).map(|index| &self.entries[index])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.position(path).is_some()
    }

    /// Every join of every registered path, in emission order
    pub fn joins(&self) -> impl Iterator<Item = &ResolvedJoin> {
        self.entries.iter().flat_map(|entry| entry.joins.iter())
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.path == path)
    }

    /// Register a relation path and every prefix of it
    ///
    /// Returns the registered entry for the full path.
    pub fn register_path(&mut self, path: &str) -> Result<&Eager<'s>, OrmError> {
        let segments = self.split_path(path)?;
        let index = self.register_segments(&segments, path)?;
        Ok(&self.entries[index])
    }

    /// Resolve a column path into a projection item
    ///
    /// With `register` the relation prefix of the path is registered for
    /// joining; without it the path is only validated.
    pub fn resolve_column_path(
        &mut self,
        path: &str,
        explicit_alias: Option<&str>,
        register: bool,
    ) -> Result<SelectItem, OrmError> {
        let (model, alias, prefix, column) = self.locate(path, register)?;
        column::select_item(model, &alias, column, explicit_alias, prefix)
    }

    /// Resolve a column path into an expression for a condition
    ///
    /// Registers joins like [`resolve_column_path`](Self::resolve_column_path).
    pub fn resolve_column_expr(&mut self, path: &str, register: bool) -> Result<Expr, OrmError> {
        let (model, alias, _, column) = self.locate(path, register)?;
        column::column_expr(model, &alias, column)
    }

    // Model, table alias and projection prefix owning the last segment of `path`
    fn locate<'p>(
        &mut self,
        path: &'p str,
        register: bool,
    ) -> Result<(&'s Model, String, Option<&'s str>, &'p str), OrmError> {
        let mut segments = self.split_path(path)?;
        let column = segments
            .pop()
            .ok_or_else(|| OrmError::InvalidPath(path.to_string()))?;

        if segments.is_empty() {
            return Ok((self.root, self.root_alias.clone(), None, column));
        }

        if register {
            let index = self.register_segments(&segments, path)?;
            let entry = &self.entries[index];
            return Ok((
                entry.target,
                entry.relation.name().to_string(),
                projection_prefix(entry.relation),
                column,
            ));
        }

        let (model, alias, prefix) = self.walk(&segments)?;
        Ok((model, alias.to_string(), prefix, column))
    }

    fn split_path<'p>(&self, path: &'p str) -> Result<Vec<&'p str>, OrmError> {
        let mut segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|segment| !PATH_SEGMENT.is_match(segment)) {
            return Err(OrmError::InvalidPath(path.to_string()));
        }

        // `product.name` on `product` means `name`
        if segments.len() > 1
            && segments[0] == self.root_alias
            && !self.root.has_relation(segments[0])
        {
            segments.remove(0);
        }

        Ok(segments)
    }

    fn register_segments(&mut self, segments: &[&str], path: &str) -> Result<usize, OrmError> {
        let mut subject: &'s Model = self.root;
        let mut subject_alias = self.root_alias.clone();
        let mut current = String::new();
        let mut index = None;

        for segment in segments {
            if !current.is_empty() {
                current.push('.');
            }
            current.push_str(segment);

            if let Some(position) = self.position(&current) {
                let entry = &self.entries[position];
                subject = entry.target;
                subject_alias = entry.alias().to_string();
                index = Some(position);
                continue;
            }

            let relation: &'s Relation =
                subject
                    .relation(segment)
                    .ok_or_else(|| OrmError::UnknownRelation {
                        name: segment.to_string(),
                        on_table: subject_alias.clone(),
                    })?;
            let target = self.schema.model(relation.target())?;
            let joins = relation.resolve(subject, &subject_alias, target)?;
            self.check_aliases(&joins, &current)?;

            log::debug!(
                "Registered path '{}' on '{}' ({} join(s))",
                current,
                self.root_alias,
                joins.len()
            );

            self.entries.push(Eager {
                path: current.clone(),
                relation,
                target,
                subject_alias: subject_alias.clone(),
                joins,
            });
            index = Some(self.entries.len() - 1);
            subject = target;
            subject_alias = relation.name().to_string();
        }

        index.ok_or_else(|| OrmError::InvalidPath(path.to_string()))
    }

    fn check_aliases(&self, joins: &[ResolvedJoin], path: &str) -> Result<(), OrmError> {
        for join in joins {
            if join.alias == self.root_alias || self.joins().any(|j| j.alias == join.alias) {
                return Err(OrmError::AliasCollision {
                    alias: join.alias.clone(),
                    path: path.to_string(),
                });
            }
        }

        Ok(())
    }

    // Follow a relation path without registering anything.
    fn walk(&self, segments: &[&str]) -> Result<(&'s Model, &str, Option<&'s str>), OrmError> {
        let mut model: &'s Model = self.root;
        let mut alias: &str = &self.root_alias;
        let mut prefix = None;
        let mut current = String::new();

        for segment in segments {
            if !current.is_empty() {
                current.push('.');
            }
            current.push_str(segment);

            let relation: &'s Relation = match self.get(&current) {
                Some(entry) => entry.relation,
                None => model
                    .relation(segment)
                    .ok_or_else(|| OrmError::UnknownRelation {
                        name: segment.to_string(),
                        on_table: alias.to_string(),
                    })?,
            };

            model = self.schema.model(relation.target())?;
            alias = relation.name();
            prefix = projection_prefix(relation);
        }

        Ok((model, alias, prefix))
    }
}
