//! Select query builder.
//!
//! [`SelectQuery`] holds the configuration of one query over a [`Schema`]:
//! the relation paths to join, explicit columns, the filter, ordering and
//! paging. Every call to [`to_statement`](SelectQuery::to_statement) assembles
//! a fresh `SelectStatement` from that configuration:
//!
//! 1. FROM the model's table, or a `UNION ALL` of its union sources
//! 2. explicit columns (registering the joins they need) or the model's
//!    default projection
//! 3. WHERE from the filter (registering the joins it needs); omitted when
//!    the filter matches everything
//! 4. ORDER BY from the query's sort rules, falling back to the model's
//! 5. one JOIN per registered relation hop in registration order, appending
//!    each joined model's default projection unless columns were explicit
//!
//! [`fetch_all`](SelectQuery::fetch_all) runs a variant of that statement
//! shaped for hydration, see
//! [`to_fetch_statement_with`](SelectQuery::to_fetch_statement_with).

use crate::config::OrmConfig;
use crate::error::OrmError;
use crate::executor::Executor;
use crate::filter::lowering::BoolOp;
use crate::filter::{self, Filter, Predicate};
use crate::model::{Model, Record, SortDirection, SortRule};
use crate::query::column::{self, SelectItem};
use crate::relation::def::on_condition;
use crate::relation::helpers::qualified;
use crate::relation::{EagerLoad, JoinKind, ResolvedJoin};
use crate::schema::Schema;
use sea_query::{Alias, Expr, SelectStatement, UnionType, Values};

/// Query builder for selecting records of one model
///
/// # Example
///
/// ```
/// use lifeline::model::Model;
/// use lifeline::relation::Relation;
/// use lifeline::schema::Schema;
/// use lifeline::config::OrmConfig;
///
/// let mut schema = Schema::new();
/// schema
///     .add(Model::new("product").with_key("id").with_columns(["name", "rrp"]))?
///     .add_relation(Relation::has_many("shop", "shop"))?;
/// schema.add(Model::new("shop").with_columns(["name", "city"]))?;
///
/// let sql = schema
///     .query("product")?
///     .with(["shop"])?
///     .to_sql_string(&OrmConfig::default())?;
///
/// assert_eq!(
///     sql,
///     r#"SELECT product.name, product.rrp, shop.name, shop.city FROM "product" AS "product" INNER JOIN "shop" AS "shop" ON shop.product_id = product.id"#
/// );
/// # Ok::<(), lifeline::OrmError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SelectQuery<'s> {
    schema: &'s Schema,
    model: &'s Model,
    alias: String,
    with: Vec<String>,
    eager: EagerLoad<'s>,
    columns: Vec<(String, Option<String>)>,
    filter: Filter,
    order_by: Vec<SortRule>,
    limit: Option<u64>,
    offset: Option<u64>,
    links: Vec<LinkJoin>,
    constraints: Vec<Predicate>,
}

// A join the query root needs to reach an intermediate table, emitted
// before the registered relation joins.
#[derive(Debug, Clone)]
struct LinkJoin {
    alias: String,
    table: String,
    join_type: Option<JoinKind>,
    conditions: Vec<String>,
}

// Registration-dependent parts of one assembly run
struct Assembly<'s> {
    eager: EagerLoad<'s>,
    columns: Vec<SelectItem>,
    predicate: Option<Predicate>,
}

impl<'s> SelectQuery<'s> {
    /// Create a query over the model registered as `model`
    pub fn new(schema: &'s Schema, model: &str) -> Result<Self, OrmError> {
        Ok(Self::for_model(schema, schema.model(model)?))
    }

    pub fn for_model(schema: &'s Schema, model: &'s Model) -> Self {
        let alias = model.alias().to_string();
        Self {
            schema,
            model,
            eager: EagerLoad::new(schema, model, alias.clone()),
            alias,
            with: Vec::new(),
            columns: Vec::new(),
            filter: Filter::match_all(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            links: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn model(&self) -> &'s Model {
        self.model
    }

    /// Alias the root model is selected under
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn filter_tree(&self) -> &Filter {
        &self.filter
    }

    /// Join the given relation paths
    ///
    /// Paths are registered immediately, so unknown relations fail here.
    /// Registering a path again is a no-op.
    pub fn with<I, S>(mut self, paths: I) -> Result<Self, OrmError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            let path = path.as_ref();
            self.eager.register_path(path)?;
            if !self.with.iter().any(|p| p == path) {
                self.with.push(path.to_string());
            }
        }
        Ok(self)
    }

    /// Select these column paths instead of the default projection
    pub fn columns<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns
            .extend(paths.into_iter().map(|path| (path.into(), None)));
        self
    }

    /// Select a column path under an explicit result alias
    pub fn column_as(mut self, path: impl Into<String>, alias: impl Into<String>) -> Self {
        self.columns.push((path.into(), Some(alias.into())));
        self
    }

    /// AND a filter into the query's filter
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = std::mem::replace(&mut self.filter, Filter::match_all()).and(filter);
        self
    }

    /// Add an ORDER BY rule; query rules replace the model's default rules
    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by.push(SortRule {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Select the root model under a different alias
    ///
    /// Relation paths joined so far are registered again against the new alias.
    pub fn aliased(mut self, alias: impl Into<String>) -> Result<Self, OrmError> {
        self.alias = alias.into();
        self.eager = EagerLoad::new(self.schema, self.model, self.alias.clone());
        for path in &self.with {
            self.eager.register_path(path)?;
        }
        Ok(self)
    }

    /// Join `join`'s table on `conditions` ahead of the relation joins
    pub(crate) fn link(mut self, join: &ResolvedJoin, conditions: Vec<String>) -> Self {
        self.links.push(LinkJoin {
            alias: join.alias.clone(),
            table: join.table.clone(),
            join_type: join.join_type,
            conditions,
        });
        self
    }

    /// AND a lowered predicate into WHERE
    pub(crate) fn constrain(mut self, predicate: Predicate) -> Self {
        self.constraints.push(predicate);
        self
    }

    fn prepare(&self) -> Result<Assembly<'s>, OrmError> {
        let mut eager = self.eager.clone();

        let columns = if self.columns.is_empty() {
            column::auto_projection(self.model, &self.alias, None)
        } else {
            self.columns
                .iter()
                .map(|(path, alias)| eager.resolve_column_path(path, alias.as_deref(), true))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut predicates = self.constraints.clone();
        if !self.filter.is_match_all() {
            if let Some(predicate) = filter::assemble(&self.filter, &mut eager)? {
                predicates.push(predicate);
            }
        }

        let predicate = match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Predicate::Group {
                op: BoolOp::All,
                items: predicates,
            }),
        };

        Ok(Assembly {
            eager,
            columns,
            predicate,
        })
    }

    /// Joins the next assembly emits, in order
    ///
    /// Includes joins registered by explicit columns and by the filter.
    pub fn resolved_joins(&self) -> Result<Vec<ResolvedJoin>, OrmError> {
        Ok(self.prepare()?.eager.joins().cloned().collect())
    }

    /// Assemble the statement using the global configuration
    pub fn to_statement(&self) -> Result<SelectStatement, OrmError> {
        self.to_statement_with(OrmConfig::global())
    }

    pub fn to_statement_with(&self, config: &OrmConfig) -> Result<SelectStatement, OrmError> {
        self.assemble(config, false)
    }

    /// The statement [`fetch_all`](Self::fetch_all) runs
    ///
    /// Differs from [`to_statement_with`](Self::to_statement_with) in two ways:
    ///
    /// - root columns [`Record::related`] reads (the key and the subject side of
    ///   every relation) are selected when the projection lacks them
    /// - auto-projected columns of joined models always get a
    ///   `{prefix}_{column}` result name, so they never shadow root columns
    ///
    /// Union models are hydrated from their projection as is.
    pub fn to_fetch_statement_with(&self, config: &OrmConfig) -> Result<SelectStatement, OrmError> {
        self.assemble(config, true)
    }

    fn assemble(&self, config: &OrmConfig, hydrate: bool) -> Result<SelectStatement, OrmError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("assemble_select", model = %self.alias, hydrate).entered();

        let Assembly {
            eager,
            mut columns,
            predicate,
        } = self.prepare()?;

        if hydrate && !self.model.is_union() {
            let projected: Vec<String> = columns.iter().map(|item| result_name(item).to_string()).collect();
            for column in self.hydration_columns()? {
                if !projected.contains(&column) {
                    columns.push(SelectItem::new(qualified(&self.alias, &column)));
                }
            }
        }

        let mut statement = SelectStatement::new();
        self.apply_from(&mut statement, config)?;

        for item in columns {
            push_item(&mut statement, item);
        }

        if let Some(predicate) = predicate {
            statement.cond_where(predicate.into_condition());
        }

        let sort_rules = if self.order_by.is_empty() {
            self.model.sort_rules()
        } else {
            self.order_by.as_slice()
        };
        for rule in sort_rules {
            statement.order_by_expr(Expr::cust(rule.column.clone()), rule.direction.into());
        }

        for link in &self.links {
            statement.join_as(
                link.join_type.unwrap_or(config.join_type).into(),
                Alias::new(link.table.clone()),
                Alias::new(link.alias.clone()),
                on_condition(&link.conditions),
            );
        }

        let auto_projection = self.columns.is_empty();
        for entry in eager.iter() {
            for join in &entry.joins {
                statement.join_as(
                    join.join_type.unwrap_or(config.join_type).into(),
                    Alias::new(join.table.clone()),
                    Alias::new(join.alias.clone()),
                    join.on_condition(),
                );
            }

            if auto_projection {
                let prefix = match entry.projection_prefix() {
                    None if hydrate => Some(entry.alias()),
                    prefix => prefix,
                };
                for item in column::auto_projection(entry.target, entry.alias(), prefix) {
                    push_item(&mut statement, item);
                }
            }
        }

        if let Some(limit) = self.limit {
            statement.limit(limit);
        }
        if let Some(offset) = self.offset {
            statement.offset(offset);
        }

        Ok(statement)
    }

    // Root columns a hydrated record needs for `Record::related`
    fn hydration_columns(&self) -> Result<Vec<String>, OrmError> {
        let mut columns: Vec<String> = self.model.key().iter().cloned().collect();
        for relation in self.model.relations() {
            let target = self.schema.model(relation.target())?;
            let joins = relation.resolve(self.model, &self.alias, target)?;
            for pair in joins.iter().take(1).flat_map(|join| &join.pairs) {
                if !columns.contains(&pair.subject_column) {
                    columns.push(pair.subject_column.clone());
                }
            }
        }
        Ok(columns)
    }

    fn apply_from(&self, statement: &mut SelectStatement, config: &OrmConfig) -> Result<(), OrmError> {
        if !self.model.is_union() {
            statement.from_as(
                Alias::new(self.model.table_name().to_string()),
                Alias::new(self.alias.clone()),
            );
            return Ok(());
        }

        let mut union: Option<SelectStatement> = None;
        for source in self.model.union_sources() {
            let mut member = source
                .columns
                .iter()
                .fold(SelectQuery::new(self.schema, &source.model)?, |query, (alias, path)| {
                    query.column_as(path.clone(), alias.clone())
                })
                .to_statement_with(config)?;
            // ORDER BY inside a UNION member would apply to the whole union
            member.clear_order_by();

            union = Some(match union.take() {
                Some(mut union) => {
                    union.union(UnionType::All, member);
                    union
                }
                None => member,
            });
        }

        if let Some(union) = union {
            statement.from_subquery(union, Alias::new(self.alias.clone()));
        }
        Ok(())
    }

    /// Build SQL and bind values using the global configuration
    pub fn build(&self) -> Result<(String, Values), OrmError> {
        self.build_with(OrmConfig::global())
    }

    pub fn build_with(&self, config: &OrmConfig) -> Result<(String, Values), OrmError> {
        Ok(render(&self.to_statement_with(config)?, config))
    }

    /// SQL with bind values inlined
    pub fn to_sql_string(&self, config: &OrmConfig) -> Result<String, OrmError> {
        Ok(config.dialect.inline(&self.to_statement_with(config)?))
    }

    /// Run the query and hydrate every row
    pub fn fetch_all<E>(&self, executor: &E) -> Result<Vec<Record<'s>>, OrmError>
    where
        E: Executor + ?Sized,
    {
        self.fetch_all_with(executor, OrmConfig::global())
    }

    pub fn fetch_all_with<E>(&self, executor: &E, config: &OrmConfig) -> Result<Vec<Record<'s>>, OrmError>
    where
        E: Executor + ?Sized,
    {
        let (sql, values) = render(&self.to_fetch_statement_with(config)?, config);
        let rows = executor.fetch_all(&sql, &values)?;
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(self.schema, self.model, row))
            .collect())
    }

    /// Run the query limited to one row
    pub fn fetch_one<E>(&self, executor: &E) -> Result<Option<Record<'s>>, OrmError>
    where
        E: Executor + ?Sized,
    {
        Ok(self.clone().limit(1).fetch_all(executor)?.into_iter().next())
    }
}

fn render(statement: &SelectStatement, config: &OrmConfig) -> (String, Values) {
    let (sql, values) = config.dialect.build(statement);
    if config.log_statements {
        log::debug!("{} ({} value(s))", sql, values.0.len());
    }
    (sql, values)
}

// Name a projected item comes back under in a row
fn result_name(item: &SelectItem) -> &str {
    match &item.alias {
        Some(alias) => alias.as_str(),
        None => item.expr.rsplit('.').next().unwrap_or(&item.expr),
    }
}

fn push_item(statement: &mut SelectStatement, item: SelectItem) {
    match item.alias {
        Some(alias) => statement.expr_as(Expr::cust(item.expr), Alias::new(alias)),
        None => statement.expr(Expr::cust(item.expr)),
    };
}
