//! Relations routed through an intermediate link table
//!
//! A relation declared with `via(table)` is resolved as two hops:
//!
//! 1. subject → link table, aliased by the link table's name, using the
//!    relation's own foreign/candidate keys against the subject;
//! 2. link table → target, aliased by the relation name. The link table has no
//!    key of its own, so the candidate key of this hop is the target foreign key
//!    (default `{targetTable}_{k}`), and the foreign key is the target candidate
//!    key (default: the target's key).
//!
//! For `product.shop` via `shop_product` this yields
//! `shop_product.product_id = product.id` and `shop.id = shop_product.shop_id`.

use crate::error::OrmError;
use crate::model::Model;
use crate::relation::def::{want_candidate_key, want_foreign_key, Hop, Relation, ResolvedJoin};
use crate::relation::identity::OrderedKey;

/// Immutable description of the second hop of a through-table relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Through {
    pub link_table: String,
    /// Link table column(s) referencing the target
    pub link_columns: Vec<String>,
    /// Target column(s) referenced by the link table
    pub target_columns: Vec<String>,
}

impl Through {
    /// Derive the link description from relation parameters and the target model
    pub fn describe(relation: &Relation, link_table: &str, target: &Model) -> Self {
        let link_columns = match relation.target_foreign_key() {
            Some(key) => key.clone(),
            None => want_foreign_key(&OrderedKey::new(), target),
        };
        let target_columns = match relation.target_candidate_key() {
            Some(key) => key.clone(),
            None => want_candidate_key(&OrderedKey::new(), target),
        };

        Self {
            link_table: link_table.to_string(),
            link_columns: link_columns.columns().to_vec(),
            target_columns: target_columns.columns().to_vec(),
        }
    }
}

pub(crate) fn resolve(
    relation: &Relation,
    link_table: &str,
    subject: &Model,
    subject_alias: &str,
    target: &Model,
) -> Result<Vec<ResolvedJoin>, OrmError> {
    let own_foreign_key = relation.foreign_key().cloned().unwrap_or_default();
    let own_candidate_key = relation.candidate_key().cloned().unwrap_or_default();

    let to_link = Hop {
        relation: relation.name(),
        alias: link_table,
        table: link_table,
        subject,
        subject_alias,
        foreign_key: &own_foreign_key,
        candidate_key: &own_candidate_key,
        join_type: relation.join_type(),
    }
    .resolve()?;

    let through = Through::describe(relation, link_table, target);
    let link = Model::new(link_table);
    let candidate_key = OrderedKey::from(through.link_columns.clone());
    let foreign_key = OrderedKey::from(through.target_columns.clone());

    let to_target = Hop {
        relation: relation.name(),
        alias: relation.name(),
        table: target.table_name(),
        subject: &link,
        subject_alias: link_table,
        foreign_key: &foreign_key,
        candidate_key: &candidate_key,
        join_type: relation.join_type(),
    }
    .resolve()?;

    Ok(vec![to_link, to_target])
}
