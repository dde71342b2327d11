use serde::{Deserialize, Serialize};

use crate::graph::{ColumnRef, LineageGraph};

/// An ordered sequence of distinct columns; length in edges is
/// `path.len() - 1`.
pub type Path = Vec<ColumnRef>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Maximum number of edges walked from the start column.
    pub max_depth: usize,
    /// Optional cap on the number of paths collected per start column.
    pub max_paths: Option<usize>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_depth: 12,
            max_paths: None,
        }
    }
}

/// Collects all simple paths from `start` to any column satisfying
/// `is_final`, walking forward edges up to `config.max_depth` hops.
///
/// The growing path itself is the visited set, so a column may appear in any
/// number of independent paths but never twice within one; together with the
/// depth bound this guarantees termination on cyclic graphs. A branch stops
/// at the first final column it reaches and is not expanded past it. Because
/// graph adjacency iterates in lexicographic order, the returned path list is
/// identical between runs over the same graph.
pub fn find_paths<F>(
    graph: &LineageGraph,
    start: &ColumnRef,
    is_final: F,
    config: &TraceConfig,
) -> Vec<Path>
where
    F: Fn(&ColumnRef) -> bool,
{
    let mut paths = vec![];
    let mut path = vec![start.clone()];
    walk(graph, start, &is_final, config, &mut path, &mut paths);
    paths
}

fn walk<F>(
    graph: &LineageGraph,
    current: &ColumnRef,
    is_final: &F,
    config: &TraceConfig,
    path: &mut Path,
    paths: &mut Vec<Path>,
) where
    F: Fn(&ColumnRef) -> bool,
{
    if config.max_paths.is_some_and(|cap| paths.len() >= cap) {
        return;
    }
    if is_final(current) {
        if path.len() > 1 {
            paths.push(path.clone());
        }
        return;
    }
    if path.len() > config.max_depth {
        return;
    }
    for next in graph.forward(current) {
        if path.contains(next) {
            continue;
        }
        let next = next.clone();
        path.push(next.clone());
        walk(graph, &next, is_final, config, path, paths);
        path.pop();
    }
}
