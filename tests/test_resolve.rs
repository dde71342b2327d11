use std::collections::HashSet;

use lintra::bridge::{BridgeConfig, SynonymRule, propose_bridges};
use lintra::catalog::{CatalogRules, Category, TableCatalog, TableHints};
use lintra::graph::{ColumnRef, Edge, LineageGraph};
use lintra::resolve::{ResolveOptions, resolve, source_columns};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
struct ExpectedMapping {
    source: String,
    target: String,
    confidence: String,
    path_length: usize,
}

#[derive(Deserialize, Debug)]
struct ResolveTest {
    name: String,
    edges: Vec<(String, String)>,
    #[serde(default)]
    source_tables: Vec<String>,
    #[serde(default)]
    target_tables: Vec<String>,
    #[serde(default)]
    start: Vec<String>,
    #[serde(default)]
    use_bridges: bool,
    #[serde(default)]
    synonyms: Vec<(String, String)>,
    #[serde(default)]
    expected: Vec<ExpectedMapping>,
}

#[derive(Deserialize, Debug)]
struct ResolveTestData {
    tests: Vec<ResolveTest>,
}

const RESOLVE_TESTS_FILE: &str = "tests/resolve_tests.toml";

fn column(qualified: &str) -> ColumnRef {
    ColumnRef::parse(qualified)
        .unwrap_or_else(|err| panic!("Bad column reference in test data: {}", err))
}

#[test]
fn test_resolve_scenarios() {
    let test_data_file =
        std::fs::read_to_string(RESOLVE_TESTS_FILE).expect("Cannot open resolve test cases");
    let test_data: ResolveTestData =
        toml::from_str(&test_data_file).expect("Cannot parse test cases defined in toml");

    for test in test_data.tests {
        println!("Testing resolution scenario: {}", &test.name);

        let mut graph = LineageGraph::default();
        // Every batch is merged twice: resolution must not change under
        // idempotent re-ingestion.
        for _ in 0..2 {
            for (from, to) in &test.edges {
                graph
                    .add_edge(Edge::extracted(column(from), column(to)))
                    .expect("Test edge rejected");
            }
        }

        let hints = TableHints {
            source_tables: test.source_tables.clone(),
            target_tables: test.target_tables.clone(),
        };
        let catalog = TableCatalog::new(CatalogRules::default(), &hints);

        let bridges = if test.use_bridges {
            let config = if test.synonyms.is_empty() {
                BridgeConfig::default()
            } else {
                BridgeConfig {
                    synonyms: test
                        .synonyms
                        .iter()
                        .map(|(from, to)| SynonymRule::new(from, to))
                        .collect(),
                }
            };
            propose_bridges(&graph, &catalog, &config)
        } else {
            vec![]
        };

        let start_columns = if test.start.is_empty() {
            source_columns(&graph, &catalog)
        } else {
            test.start.iter().map(|start| column(start)).collect()
        };

        let mappings = resolve(
            &graph,
            &catalog,
            &start_columns,
            Some(&bridges),
            &ResolveOptions::default(),
        );

        // Structural invariants that hold for every scenario.
        for mapping in &mappings {
            assert_ne!(mapping.source, mapping.target, "self-mapping emitted");
            assert_eq!(
                catalog.classify(&mapping.target.table),
                Category::Target,
                "mapping target is not a Target-category table"
            );
            for path in &mapping.paths {
                let distinct: HashSet<_> = path.iter().collect();
                assert_eq!(distinct.len(), path.len(), "path revisits a column");
            }
        }

        // Resolution must be deterministic, including order.
        let rerun = resolve(
            &graph,
            &catalog,
            &start_columns,
            Some(&bridges),
            &ResolveOptions {
                parallel: true,
                ..ResolveOptions::default()
            },
        );
        assert_eq!(mappings.len(), rerun.len());
        for (a, b) in mappings.iter().zip(rerun.iter()) {
            assert_eq!(a.source, b.source);
            assert_eq!(a.target, b.target);
            assert_eq!(a.confidence, b.confidence);
        }

        assert_eq!(
            mappings.len(),
            test.expected.len(),
            "unexpected mapping count in scenario `{}`: {:?}",
            test.name,
            mappings
        );
        for (mapping, expected) in mappings.iter().zip(test.expected.iter()) {
            assert_eq!(mapping.source, column(&expected.source), "{}", test.name);
            assert_eq!(mapping.target, column(&expected.target), "{}", test.name);
            assert_eq!(
                mapping.confidence.to_string(),
                expected.confidence,
                "{}",
                test.name
            );
            assert_eq!(
                mapping.shortest_path_len(),
                expected.path_length,
                "{}",
                test.name
            );
        }
    }
}
