//! Join result hydration.
//!
//! Joined selects label related columns `alias.column`. When such a row is loaded,
//! the prefixed keys are grouped by alias, the alias is resolved to a relation of
//! the entity, and the group becomes the related record (or an empty relation when
//! every column in it is null, as a left join with no match produces).

use super::{singular, LifeEntity, Record};
use crate::attribute::ModelConfig;
use crate::value::{is_null, Attributes};
use std::collections::BTreeMap;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Relation name for a join prefix.
///
/// The prefix is singularized, then looked up in `relation_aliases` (by its
/// singular form first, then as written).
pub fn relation_name_for_prefix(config: &ModelConfig, prefix: &str) -> String {
    let single = singular(prefix);
    config
        .relation_alias(&single)
        .or_else(|| config.relation_alias(prefix))
        .map(str::to_string)
        .unwrap_or(single)
}

/// Split prefixed columns out of `attributes`.
///
/// Returns the remaining attributes and the hydrated relations. Prefixes that do
/// not resolve to a relation of `entity` are left in the attributes untouched.
pub fn split_relations(
    entity: &dyn LifeEntity,
    mut attributes: Attributes,
) -> (Attributes, Vec<(String, Option<Record>)>) {
    let mut groups: BTreeMap<String, Attributes> = BTreeMap::new();
    for (key, value) in &attributes {
        if let Some((prefix, column)) = key.split_once('.') {
            groups
                .entry(prefix.to_string())
                .or_default()
                .insert(column.to_string(), value.clone());
        }
    }

    let mut relations = Vec::with_capacity(groups.len());
    for (prefix, columns) in groups {
        let mut name = relation_name_for_prefix(entity.model_config(), &prefix);
        let mut def = entity.relation(&name);
        // Aliases of has-many relations stay plural
        if def.is_none() && name != prefix {
            def = entity.relation(&prefix);
            if def.is_some() {
                name = prefix.clone();
            }
        }
        let Some(def) = def else {
            log::debug!(
                "{}: no relation for join prefix '{prefix}', keeping {} column(s) as attributes",
                entity.table_name(),
                columns.len()
            );
            continue;
        };

        for column in columns.keys() {
            attributes.remove(&format!("{prefix}.{column}"));
        }

        let related = if columns.values().all(is_null) {
            None
        } else {
            #[cfg(feature = "metrics")]
            METRICS.record_hydrated();
            Some(Record::from_row(def.related.clone(), columns))
        };
        relations.push((name, related));
    }

    (attributes, relations)
}
