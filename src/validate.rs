use serde::{Deserialize, Serialize};

use crate::graph::ColumnRef;
use crate::resolve::Mapping;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExpectationStatus {
    Verified,
    Partial,
    NotFound,
}

/// An expected `source -> target` pair, both sides written as
/// `schema.table.column`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectation {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpectationResult {
    pub source: String,
    pub target: String,
    pub status: ExpectationStatus,
    pub evidence_score: i32,
}

/// Corroboration rule: fires when the expected pair mentions both hints and
/// any of the keywords occurs in the analyzed script text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRule {
    pub source_hint: String,
    pub target_hint: String,
    pub keywords: Vec<String>,
}

impl DomainRule {
    pub fn new(source_hint: &str, target_hint: &str, keywords: &[&str]) -> Self {
        Self {
            source_hint: source_hint.to_lowercase(),
            target_hint: target_hint.to_lowercase(),
            keywords: keywords.iter().map(|keyword| keyword.to_lowercase()).collect(),
        }
    }
}

/// Signal weights, status thresholds and domain rules for expectation
/// scoring. Everything an operator might want to tune is here rather than
/// buried in the scoring code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub exact_pair: i32,
    pub source_table: i32,
    pub target_table: i32,
    pub domain: i32,
    pub verified_at: i32,
    pub partial_at: i32,
    pub domain_rules: Vec<DomainRule>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            exact_pair: 3,
            source_table: 1,
            target_table: 1,
            domain: 2,
            verified_at: 4,
            partial_at: 2,
            domain_rules: vec![
                DomainRule::new("fee", "fee", &["feecalc", "fee calculation", "calculatefee"]),
                DomainRule::new(
                    "currency",
                    "amount",
                    &["fx", "currency conversion", "currencyrate"],
                ),
                DomainRule::new("gl", "gl", &["general ledger", "glaccount", "glmap"]),
            ],
        }
    }
}

/// Scores each expected pair against the resolved mappings with independent,
/// additive evidence signals, then assigns a status by the configured
/// thresholds. `script_text`, when given, is the raw script the edges were
/// extracted from and feeds the domain-corroboration signal.
pub fn validate(
    mappings: &[Mapping],
    expected: &[Expectation],
    script_text: Option<&str>,
    config: &ValidationConfig,
) -> Vec<ExpectationResult> {
    let script_lower = script_text.map(str::to_lowercase);

    let mut results: Vec<ExpectationResult> = expected
        .iter()
        .map(|expectation| score_expectation(mappings, expectation, script_lower.as_deref(), config))
        .collect();

    results.sort_by(|a, b| {
        a.target
            .cmp(&b.target)
            .then_with(|| a.source.cmp(&b.source))
    });
    results
}

fn score_expectation(
    mappings: &[Mapping],
    expectation: &Expectation,
    script_lower: Option<&str>,
    config: &ValidationConfig,
) -> ExpectationResult {
    let source_lower = expectation.source.to_lowercase();
    let target_lower = expectation.target.to_lowercase();
    let mut evidence_score = 0;

    if mappings.iter().any(|mapping| {
        spec_matches(&mapping.source, &source_lower) && spec_matches(&mapping.target, &target_lower)
    }) {
        evidence_score += config.exact_pair;
    }

    if let Ok(source_spec) = ColumnRef::parse(&source_lower) {
        if mappings
            .iter()
            .any(|mapping| mapping.source.table == source_spec.table)
        {
            evidence_score += config.source_table;
        }
    }
    if let Ok(target_spec) = ColumnRef::parse(&target_lower) {
        if mappings
            .iter()
            .any(|mapping| mapping.target.table == target_spec.table)
        {
            evidence_score += config.target_table;
        }
    }

    if let Some(script) = script_lower {
        for rule in &config.domain_rules {
            if source_lower.contains(&rule.source_hint)
                && target_lower.contains(&rule.target_hint)
                && rule.keywords.iter().any(|keyword| script.contains(keyword))
            {
                evidence_score += config.domain;
            }
        }
    }

    let status = if evidence_score >= config.verified_at {
        ExpectationStatus::Verified
    } else if evidence_score >= config.partial_at {
        ExpectationStatus::Partial
    } else {
        ExpectationStatus::NotFound
    };

    ExpectationResult {
        source: expectation.source.clone(),
        target: expectation.target.clone(),
        status,
        evidence_score,
    }
}

/// Exact or substring match of a discovered column against an expected
/// `schema.table.column` spec.
fn spec_matches(column: &ColumnRef, spec_lower: &str) -> bool {
    let rendered = column.to_string();
    if rendered == spec_lower {
        return true;
    }
    match ColumnRef::parse(spec_lower) {
        Ok(spec) => {
            column.name == spec.name && rendered.contains(&spec.table.qualified())
        }
        Err(_) => rendered.contains(spec_lower),
    }
}
