use lintra::bridge::{BridgeConfig, SynonymRule, propose_bridges};
use lintra::catalog::{CatalogRules, TableCatalog, TableHints};
use lintra::graph::{ColumnRef, Edge, LineageGraph, Provenance};

fn column(qualified: &str) -> ColumnRef {
    ColumnRef::parse(qualified).expect("bad column reference")
}

fn graph_of(edges: &[(&str, &str)]) -> LineageGraph {
    let mut graph = LineageGraph::default();
    for (from, to) in edges {
        graph
            .add_edge(Edge::extracted(column(from), column(to)))
            .unwrap();
    }
    graph
}

fn catalog() -> TableCatalog {
    TableCatalog::new(CatalogRules::default(), &TableHints::default())
}

#[test]
fn test_exact_name_bridges_intermediate_to_target() {
    let graph = graph_of(&[
        ("staging.t.srcid", "#stage.idempotencykey"),
        ("staging.t.other", "core.ledgerfinal.idempotencykey"),
    ]);

    let bridges = propose_bridges(&graph, &catalog(), &BridgeConfig { synonyms: vec![] });
    assert_eq!(bridges.len(), 1);
    assert_eq!(bridges[0].from, column("#stage.idempotencykey"));
    assert_eq!(bridges[0].to, column("core.ledgerfinal.idempotencykey"));
    assert_eq!(bridges[0].provenance, Provenance::Bridged);
}

#[test]
fn test_no_bridge_where_an_edge_already_exists() {
    let graph = graph_of(&[("#stage.batchid", "core.ledgerfinal.batchid")]);

    let bridges = propose_bridges(&graph, &catalog(), &BridgeConfig::default());
    assert!(bridges.is_empty());
}

#[test]
fn test_synonym_rule_bridges_renamed_columns() {
    let graph = graph_of(&[
        ("staging.t.srcid", "#raw.srcid"),
        ("staging.t.batch", "core.ledgerfinal.batchid"),
    ]);

    let config = BridgeConfig {
        synonyms: vec![SynonymRule::new("srcid", "batchid")],
    };
    let bridges = propose_bridges(&graph, &catalog(), &config);
    assert_eq!(bridges.len(), 1);
    assert_eq!(bridges[0].from, column("#raw.srcid"));
    assert_eq!(bridges[0].to, column("core.ledgerfinal.batchid"));
}

#[test]
fn test_source_columns_never_bridge() {
    // `staging.t.batchid` shares its name with the target column, but only
    // intermediate columns are bridge origins.
    let graph = graph_of(&[("staging.t.batchid", "audit.failedtxn.reason")]);
    let graph = {
        let mut graph = graph;
        graph
            .add_edge(Edge::extracted(
                column("ref.r.k"),
                column("core.ledgerfinal.batchid"),
            ))
            .unwrap();
        graph
    };

    let bridges = propose_bridges(&graph, &catalog(), &BridgeConfig { synonyms: vec![] });
    assert!(bridges.is_empty());
}

#[test]
fn test_no_candidates_is_a_normal_outcome() {
    let graph = graph_of(&[("staging.t.a", "core.out.b")]);
    let bridges = propose_bridges(&graph, &catalog(), &BridgeConfig::default());
    assert!(bridges.is_empty());
}
