use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, TableCatalog};
use crate::graph::{ColumnRef, Edge, LineageGraph, Provenance};
use crate::trace::{Path, TraceConfig, find_paths};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Confidence {
    Extracted,
    Bridged,
    Mixed,
}

/// One resolved source-to-target lineage, carrying every simple path that
/// connects the pair. Only [`resolve`] constructs these.
#[derive(Debug, Clone, Serialize)]
pub struct Mapping {
    pub source: ColumnRef,
    pub target: ColumnRef,
    pub paths: Vec<Path>,
    pub confidence: Confidence,
}

impl Mapping {
    /// Edge count of the shortest connecting path.
    pub fn shortest_path_len(&self) -> usize {
        self.paths
            .iter()
            .map(|path| path.len() - 1)
            .min()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    pub trace: TraceConfig,
    /// Fan resolution out over worker threads, one start column per task.
    /// The graph is read-only at this point, so no locking is involved and
    /// the output is identical either way.
    pub parallel: bool,
}

/// Enumerates start-column candidates: columns living in Source-category
/// tables. Unknown tables are deliberately excluded so they cannot become
/// false origins.
pub fn source_columns(graph: &LineageGraph, catalog: &TableCatalog) -> Vec<ColumnRef> {
    graph
        .columns()
        .filter(|column| catalog.classify(&column.table) == Category::Source)
        .cloned()
        .collect()
}

/// Resolves end-to-end mappings for the given start columns.
///
/// Per start column the base graph is traced first; only when that yields
/// nothing and bridge edges were supplied is the search repeated over the
/// bridged graph. Paths are grouped into one [`Mapping`] per distinct
/// `(source, target)` pair. Self-mappings are discarded, and a mapping whose
/// target table classifies as Intermediate is never emitted. The result is
/// sorted by target table, then source table, then source column, so two runs
/// over identical input produce byte-identical reports.
pub fn resolve(
    graph: &LineageGraph,
    catalog: &TableCatalog,
    start_columns: &[ColumnRef],
    bridges: Option<&[Edge]>,
    options: &ResolveOptions,
) -> Vec<Mapping> {
    let bridged_graph = bridges.filter(|bridges| !bridges.is_empty()).map(|bridges| {
        let mut bridged = graph.clone();
        for edge in bridges {
            // Bridge endpoints come out of the graph itself and are valid.
            let _ = bridged.add_edge(edge.clone());
        }
        bridged
    });

    let resolve_one = |start: &ColumnRef| -> Vec<Mapping> {
        let is_final =
            |column: &ColumnRef| catalog.classify(&column.table) == Category::Target;
        let mut paths = find_paths(graph, start, is_final, &options.trace);
        if paths.is_empty() {
            if let Some(bridged) = &bridged_graph {
                paths = find_paths(bridged, start, is_final, &options.trace);
            }
        }
        collect_mappings(graph, catalog, start, paths)
    };

    let mut mappings: Vec<Mapping> = if options.parallel {
        start_columns.par_iter().flat_map(resolve_one).collect()
    } else {
        start_columns.iter().flat_map(resolve_one).collect()
    };

    mappings.sort_by(|a, b| {
        a.target
            .table
            .cmp(&b.target.table)
            .then_with(|| a.source.table.cmp(&b.source.table))
            .then_with(|| a.source.name.cmp(&b.source.name))
            .then_with(|| a.target.name.cmp(&b.target.name))
    });
    mappings
}

fn collect_mappings(
    graph: &LineageGraph,
    catalog: &TableCatalog,
    start: &ColumnRef,
    paths: Vec<Path>,
) -> Vec<Mapping> {
    let mut by_target: BTreeMap<ColumnRef, Vec<Path>> = BTreeMap::new();
    for path in paths {
        let Some(target) = path.last() else {
            continue;
        };
        by_target.entry(target.clone()).or_default().push(path);
    }

    let mut mappings = vec![];
    for (target, paths) in by_target {
        if target == *start {
            continue;
        }
        // A final column must live in a Target table; anything else slipped
        // through a catalog edge case and is dropped here as a correctness
        // invariant.
        if catalog.classify(&target.table) != Category::Target {
            log::debug!(
                "Dropping mapping {} -> {}: target table is not Target-category",
                start,
                target
            );
            continue;
        }

        let bridged_paths = paths.iter().filter(|path| uses_bridge(graph, path)).count();
        let confidence = if bridged_paths == 0 {
            Confidence::Extracted
        } else if bridged_paths == paths.len() {
            Confidence::Bridged
        } else {
            Confidence::Mixed
        };
        mappings.push(Mapping {
            source: start.clone(),
            target,
            paths,
            confidence,
        });
    }
    mappings
}

fn uses_bridge(base: &LineageGraph, path: &Path) -> bool {
    path.windows(2)
        .any(|hop| !base.has_edge_with(&hop[0], &hop[1], Provenance::Extracted))
}
