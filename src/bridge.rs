use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{Category, TableCatalog};
use crate::graph::{ColumnRef, Edge, LineageGraph};

/// A substring rewrite rule bridging an intermediate column name to a target
/// column name (`srcid` feeding `batchid`, and so on).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymRule {
    pub from: String,
    pub to: String,
}

impl SynonymRule {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_lowercase(),
            to: to.to_lowercase(),
        }
    }
}

/// Configuration for heuristic gap bridging. The default synonym table holds
/// the column renames observed across the settlement procedures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub synonyms: Vec<SynonymRule>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            synonyms: vec![
                SynonymRule::new("srcid", "batchid"),
                SynonymRule::new("txnexternalid", "idempotencykey"),
                SynonymRule::new("hashid", "idempotencykey"),
                SynonymRule::new("batchdate", "postingdate"),
                SynonymRule::new("fromccy", "fromcurrency"),
                SynonymRule::new("toccy", "tocurrency"),
                SynonymRule::new("fxrate", "rate"),
            ],
        }
    }
}

/// Proposes low-confidence `Bridged` edges from intermediate-table columns to
/// target-table columns where extraction left no path: first by identical
/// unqualified column name, then by the configured synonym rules. Every
/// candidate is returned; whether they are used at all is the resolver's
/// decision. An empty result is a normal outcome.
pub fn propose_bridges(
    graph: &LineageGraph,
    catalog: &TableCatalog,
    config: &BridgeConfig,
) -> Vec<Edge> {
    let mut intermediate_columns: Vec<&ColumnRef> = vec![];
    let mut target_columns_by_name: BTreeMap<&str, Vec<&ColumnRef>> = BTreeMap::new();
    for column in graph.columns() {
        match catalog.classify(&column.table) {
            Category::Intermediate => intermediate_columns.push(column),
            Category::Target => target_columns_by_name
                .entry(column.name.as_str())
                .or_default()
                .push(column),
            Category::Source | Category::Unknown => {}
        }
    }

    let mut proposed: BTreeSet<(&ColumnRef, &ColumnRef)> = BTreeSet::new();

    // Exact name match between intermediate and target columns.
    for from in &intermediate_columns {
        for to in target_columns_by_name
            .get(from.name.as_str())
            .into_iter()
            .flatten()
        {
            if !graph.has_edge(from, to) {
                log::debug!("Bridge candidate {} -> {} (matching column name)", from, to);
                proposed.insert((*from, *to));
            }
        }
    }

    // Synonym rules, applied in configuration order.
    for rule in &config.synonyms {
        for from in &intermediate_columns {
            if !from.name.contains(&rule.from) {
                continue;
            }
            for (name, targets) in &target_columns_by_name {
                if !name.contains(&rule.to) {
                    continue;
                }
                for to in targets {
                    if !graph.has_edge(from, to) {
                        log::debug!(
                            "Bridge candidate {} -> {} (synonym {} -> {})",
                            from,
                            to,
                            rule.from,
                            rule.to
                        );
                        proposed.insert((*from, *to));
                    }
                }
            }
        }
    }

    proposed
        .into_iter()
        .map(|(from, to)| Edge::bridged(from.clone(), to.clone()))
        .collect()
}
