//! Relation definitions and join resolution
//!
//! A [`Relation`] is a named, directed edge from a subject model to a target
//! model. It only stores declarative parameters (names and optional explicit
//! keys); resolving it against a subject produces [`ResolvedJoin`] values that
//! the select assembler turns into JOIN clauses.
//!
//! # Key defaults
//!
//! For `HasOne`/`HasMany` relations the candidate key defaults to the subject's
//! key and the foreign key defaults to `{subjectTable}_{k}` for every `k` of the
//! subject's key. The two defaults are independent: the foreign key is always
//! derived from the subject's own key, even if only the candidate key was set
//! explicitly.

use crate::error::OrmError;
use crate::model::Model;
use crate::relation::identity::OrderedKey;
use sea_query::{Condition, Expr};

/// Type of relationship between models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    /// One-to-one relationship, foreign key lives on the target
    HasOne,
    /// One-to-many relationship, foreign key lives on the target
    HasMany,
    /// Many-to-one relationship, foreign key lives on the subject
    BelongsTo,
}

/// JOIN flavour used for a relation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
}

impl From<JoinKind> for sea_query::JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => sea_query::JoinType::InnerJoin,
            JoinKind::Left => sea_query::JoinType::LeftJoin,
        }
    }
}

/// A named edge from a subject model to a target model
///
/// # Example
///
/// ```
/// use lifeline::relation::Relation;
///
/// // product has many shops through the `shop_product` link table
/// let relation = Relation::has_many("shop", "shop").via("shop_product");
/// assert_eq!(relation.name(), "shop");
/// assert_eq!(relation.via_table(), Some("shop_product"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    rel_type: RelationType,
    subject: Option<String>,
    target: String,
    foreign_key: OrderedKey,
    candidate_key: OrderedKey,
    column_prefix: Option<String>,
    join_type: Option<JoinKind>,
    via: Option<String>,
    target_foreign_key: OrderedKey,
    target_candidate_key: OrderedKey,
}

impl Relation {
    /// Create a relation of the given type to the model registered as `target`
    pub fn new(rel_type: RelationType, name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rel_type,
            subject: None,
            target: target.into(),
            foreign_key: OrderedKey::new(),
            candidate_key: OrderedKey::new(),
            column_prefix: None,
            join_type: None,
            via: None,
            target_foreign_key: OrderedKey::new(),
            target_candidate_key: OrderedKey::new(),
        }
    }

    pub fn has_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(RelationType::HasOne, name, target)
    }

    pub fn has_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(RelationType::HasMany, name, target)
    }

    pub fn belongs_to(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(RelationType::BelongsTo, name, target)
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_foreign_key(mut self, key: impl Into<OrderedKey>) -> Self {
        self.foreign_key = key.into();
        self
    }

    pub fn with_candidate_key(mut self, key: impl Into<OrderedKey>) -> Self {
        self.candidate_key = key.into();
        self
    }

    /// Prefix for the result aliases of this relation's auto-projected columns
    pub fn with_column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.column_prefix = Some(prefix.into());
        self
    }

    pub fn with_join_type(mut self, join_type: JoinKind) -> Self {
        self.join_type = Some(join_type);
        self
    }

    /// Route the relation through an intermediate link table
    pub fn via(mut self, table: impl Into<String>) -> Self {
        self.via = Some(table.into());
        self
    }

    /// Column(s) on the link table referencing the target
    pub fn with_target_foreign_key(mut self, key: impl Into<OrderedKey>) -> Self {
        self.target_foreign_key = key.into();
        self
    }

    /// Column(s) on the target referenced by the link table
    pub fn with_target_candidate_key(mut self, key: impl Into<OrderedKey>) -> Self {
        self.target_candidate_key = key.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rel_type(&self) -> RelationType {
        self.rel_type
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Explicit foreign key, `None` if it is left to its default
    pub fn foreign_key(&self) -> Option<&OrderedKey> {
        (!self.foreign_key.is_empty()).then_some(&self.foreign_key)
    }

    /// Explicit candidate key, `None` if it is left to its default
    pub fn candidate_key(&self) -> Option<&OrderedKey> {
        (!self.candidate_key.is_empty()).then_some(&self.candidate_key)
    }

    /// The column prefix, defaulting to the relation name
    pub fn column_prefix(&self) -> &str {
        self.column_prefix.as_deref().unwrap_or(&self.name)
    }

    pub fn join_type(&self) -> Option<JoinKind> {
        self.join_type
    }

    pub fn via_table(&self) -> Option<&str> {
        self.via.as_deref()
    }

    pub fn target_foreign_key(&self) -> Option<&OrderedKey> {
        (!self.target_foreign_key.is_empty()).then_some(&self.target_foreign_key)
    }

    pub fn target_candidate_key(&self) -> Option<&OrderedKey> {
        (!self.target_candidate_key.is_empty()).then_some(&self.target_candidate_key)
    }

    /// The foreign key to join with: the explicit one or `{table}_{k}` for the
    /// key of `model`
    pub fn want_foreign_key(&self, model: &Model) -> OrderedKey {
        want_foreign_key(&self.foreign_key, model)
    }

    /// The candidate key to join against: the explicit one or the key of `model`
    pub fn want_candidate_key(&self, model: &Model) -> OrderedKey {
        want_candidate_key(&self.candidate_key, model)
    }

    /// Pair foreign key columns with candidate key columns positionally
    ///
    /// `owner` is the model whose key provides the defaults: the subject for
    /// `HasOne`/`HasMany`, the target for `BelongsTo`.
    pub fn resolve_conditions(&self, owner: &Model) -> Result<Vec<(String, String)>, OrmError> {
        let candidate_key = self.want_candidate_key(owner);
        let foreign_key = self.want_foreign_key(owner);
        pair_keys(&self.name, owner, &foreign_key, &candidate_key)
    }

    /// Resolve this relation into the joins needed to reach `target` from
    /// `subject`, where `subject` is known in the query under `subject_alias`
    ///
    /// Direct relations yield one join aliased by the relation name. Relations
    /// declared with [`via`](Self::via) yield two: the link table first (aliased
    /// by its table name), then the target.
    pub fn resolve(
        &self,
        subject: &Model,
        subject_alias: &str,
        target: &Model,
    ) -> Result<Vec<ResolvedJoin>, OrmError> {
        if let Some(via) = &self.via {
            return crate::relation::through::resolve(self, via, subject, subject_alias, target);
        }

        let join = match self.rel_type {
            RelationType::HasOne | RelationType::HasMany => Hop {
                relation: &self.name,
                alias: &self.name,
                table: target.table_name(),
                subject,
                subject_alias,
                foreign_key: &self.foreign_key,
                candidate_key: &self.candidate_key,
                join_type: self.join_type,
            }
            .resolve()?,
            RelationType::BelongsTo => self.resolve_belongs_to(subject_alias, target)?,
        };

        Ok(vec![join])
    }

    // The mirrored edge: keys default from the target, the foreign key lives
    // on the subject.
    fn resolve_belongs_to(&self, subject_alias: &str, target: &Model) -> Result<ResolvedJoin, OrmError> {
        let pairs = self.resolve_conditions(target)?;

        Ok(ResolvedJoin::new(
            &self.name,
            target.table_name(),
            self.join_type,
            subject_alias,
            pairs
                .into_iter()
                .map(|(fk, ck)| KeyPair {
                    target_column: ck,
                    subject_column: fk,
                })
                .collect(),
        ))
    }
}

/// One column pair of a join condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// Column on the joined (target side) table
    pub target_column: String,
    /// Column on the table the join starts from
    pub subject_column: String,
}

/// A join produced by relation resolution
///
/// Rendered as `JOIN {table} {alias} ON {alias}.{target} = {subject}.{subject_column}`
/// with one condition per key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJoin {
    pub alias: String,
    pub table: String,
    pub join_type: Option<JoinKind>,
    pub subject_alias: String,
    pub pairs: Vec<KeyPair>,
}

impl ResolvedJoin {
    pub fn new(
        alias: &str,
        table: &str,
        join_type: Option<JoinKind>,
        subject_alias: &str,
        pairs: Vec<KeyPair>,
    ) -> Self {
        Self {
            alias: alias.to_string(),
            table: table.to_string(),
            join_type,
            subject_alias: subject_alias.to_string(),
            pairs,
        }
    }

    /// Join conditions as SQL fragments, in key order
    pub fn conditions(&self) -> Vec<String> {
        self.pairs
            .iter()
            .map(|pair| {
                crate::relation::helpers::join_condition(
                    &self.alias,
                    &pair.target_column,
                    &self.subject_alias,
                    &pair.subject_column,
                )
            })
            .collect()
    }

    /// Join conditions as a SeaQuery `Condition` (ANDed)
    pub fn on_condition(&self) -> Condition {
        on_condition(&self.conditions())
    }
}

pub(crate) fn on_condition(conditions: &[String]) -> Condition {
    conditions
        .iter()
        .fold(Condition::all(), |condition, sql| condition.add(Expr::cust(sql.clone())))
}

/// Parameters of a single join hop
///
/// Through-table relations resolve as two hops built from the same relation
/// parameters; nothing is mutated in between.
pub(crate) struct Hop<'a> {
    pub relation: &'a str,
    pub alias: &'a str,
    pub table: &'a str,
    pub subject: &'a Model,
    pub subject_alias: &'a str,
    pub foreign_key: &'a OrderedKey,
    pub candidate_key: &'a OrderedKey,
    pub join_type: Option<JoinKind>,
}

impl Hop<'_> {
    pub fn resolve(&self) -> Result<ResolvedJoin, OrmError> {
        let candidate_key = want_candidate_key(self.candidate_key, self.subject);
        let foreign_key = want_foreign_key(self.foreign_key, self.subject);
        let pairs = pair_keys(self.relation, self.subject, &foreign_key, &candidate_key)?;

        log::trace!(
            "Resolved relation '{}' as {} {} from '{}' on ({}) = ({})",
            self.relation,
            self.table,
            self.alias,
            self.subject_alias,
            foreign_key,
            candidate_key
        );

        Ok(ResolvedJoin::new(
            self.alias,
            self.table,
            self.join_type,
            self.subject_alias,
            pairs
                .into_iter()
                .map(|(fk, ck)| KeyPair {
                    target_column: fk,
                    subject_column: ck,
                })
                .collect(),
        ))
    }
}

pub(crate) fn want_candidate_key(explicit: &OrderedKey, model: &Model) -> OrderedKey {
    if explicit.is_empty() {
        model.key().clone()
    } else {
        explicit.clone()
    }
}

pub(crate) fn want_foreign_key(explicit: &OrderedKey, model: &Model) -> OrderedKey {
    if explicit.is_empty() {
        model.key().prefixed(model.table_name())
    } else {
        explicit.clone()
    }
}

fn pair_keys(
    relation: &str,
    owner: &Model,
    foreign_key: &OrderedKey,
    candidate_key: &OrderedKey,
) -> Result<Vec<(String, String)>, OrmError> {
    if candidate_key.is_empty() {
        return Err(OrmError::NoCandidateKey {
            relation: relation.to_string(),
            subject: owner.alias().to_string(),
        });
    }

    if foreign_key.is_empty() {
        return Err(OrmError::NoForeignKey {
            relation: relation.to_string(),
            subject: owner.alias().to_string(),
        });
    }

    if foreign_key.arity() != candidate_key.arity() {
        return Err(OrmError::KeyCardinalityMismatch {
            foreign_key: foreign_key.columns().to_vec(),
            candidate_key: candidate_key.columns().to_vec(),
        });
    }

    Ok(foreign_key
        .iter()
        .cloned()
        .zip(candidate_key.iter().cloned())
        .collect())
}
