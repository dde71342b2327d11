use lintra::catalog::{CatalogRules, TableCatalog, TableHints};
use lintra::graph::{ColumnRef, Edge, LineageGraph};
use lintra::resolve::{Mapping, ResolveOptions, resolve, source_columns};
use lintra::validate::{Expectation, ExpectationStatus, ValidationConfig, validate};

fn column(qualified: &str) -> ColumnRef {
    ColumnRef::parse(qualified).expect("bad column reference")
}

fn expectation(source: &str, target: &str) -> Expectation {
    Expectation {
        source: source.to_owned(),
        target: target.to_owned(),
    }
}

/// The multi-hop settlement flow used across the validation tests:
/// staging.t.srcid reaches core.ledgerfinal.idempotencykey through two temp
/// tables.
fn resolved_mappings() -> Vec<Mapping> {
    let mut graph = LineageGraph::default();
    for (from, to) in [
        ("staging.t.srcid", "#raw.rid"),
        ("#raw.rid", "#stage.rid2"),
        ("#stage.rid2", "core.ledgerfinal.idempotencykey"),
    ] {
        graph
            .add_edge(Edge::extracted(column(from), column(to)))
            .unwrap();
    }
    let catalog = TableCatalog::new(CatalogRules::default(), &TableHints::default());
    let starts = source_columns(&graph, &catalog);
    resolve(&graph, &catalog, &starts, None, &ResolveOptions::default())
}

#[test]
fn test_resolved_pair_is_verified() {
    let results = validate(
        &resolved_mappings(),
        &[expectation(
            "staging.t.srcid",
            "core.ledgerfinal.idempotencykey",
        )],
        None,
        &ValidationConfig::default(),
    );
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ExpectationStatus::Verified);
    assert!(results[0].evidence_score >= 4);
}

#[test]
fn test_expected_pair_matching_is_case_insensitive() {
    let results = validate(
        &resolved_mappings(),
        &[expectation(
            "Staging.T.SrcId",
            "Core.LedgerFinal.IdempotencyKey",
        )],
        None,
        &ValidationConfig::default(),
    );
    assert_eq!(results[0].status, ExpectationStatus::Verified);
}

#[test]
fn test_unrelated_pair_is_not_found() {
    let results = validate(
        &resolved_mappings(),
        &[expectation("staging.t.missing", "core.other.nothing")],
        None,
        &ValidationConfig::default(),
    );
    assert_eq!(results[0].status, ExpectationStatus::NotFound);
    assert!(results[0].evidence_score <= 1);
}

#[test]
fn test_table_presence_alone_scores_partial() {
    // Both tables appear in the discovered mappings but the column pair
    // itself was never resolved.
    let results = validate(
        &resolved_mappings(),
        &[expectation("staging.t.whatever", "core.ledgerfinal.whatever")],
        None,
        &ValidationConfig::default(),
    );
    assert_eq!(results[0].status, ExpectationStatus::Partial);
    assert_eq!(results[0].evidence_score, 2);
}

#[test]
fn test_domain_corroboration_and_threshold_config() {
    let script = "-- fee posting\nSET @Fee = dbo.CalculateFee(@Amount, @Channel);";
    let expected = [expectation("ref.feeconfig.feeflat", "core.ledgerfinal.feeamount")];

    let results = validate(
        &resolved_mappings(),
        &expected,
        Some(script),
        &ValidationConfig::default(),
    );
    // Target table presence (+1) plus fee-domain corroboration (+2).
    assert_eq!(results[0].evidence_score, 3);
    assert_eq!(results[0].status, ExpectationStatus::Partial);

    // The same evidence clears a lowered verification threshold.
    let lenient = ValidationConfig {
        verified_at: 3,
        ..ValidationConfig::default()
    };
    let results = validate(&resolved_mappings(), &expected, Some(script), &lenient);
    assert_eq!(results[0].status, ExpectationStatus::Verified);
}

#[test]
fn test_results_are_sorted_by_target_then_source() {
    let results = validate(
        &resolved_mappings(),
        &[
            expectation("staging.t.b", "core.zeta.x"),
            expectation("staging.t.a", "core.alpha.x"),
            expectation("staging.t.a", "core.zeta.x"),
        ],
        None,
        &ValidationConfig::default(),
    );
    let order: Vec<(&str, &str)> = results
        .iter()
        .map(|result| (result.target.as_str(), result.source.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("core.alpha.x", "staging.t.a"),
            ("core.zeta.x", "staging.t.a"),
            ("core.zeta.x", "staging.t.b"),
        ]
    );
}
