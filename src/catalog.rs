use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::TableRef;

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
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Source,
    Intermediate,
    Target,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Prefix,
    Contains,
    Exact,
}

/// One ordered categorization rule. `Prefix` and `Contains` match against the
/// qualified `schema.name`; `Exact` also matches the bare table name, which is
/// how single-letter CTE aliases are recognized without swallowing longer
/// names that merely contain them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamePattern {
    pub kind: PatternKind,
    pub pattern: String,
}

impl NamePattern {
    pub fn new(kind: PatternKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: pattern.to_lowercase(),
        }
    }

    fn matches(&self, table: &TableRef) -> bool {
        let qualified = table.qualified();
        match self.kind {
            PatternKind::Prefix => table.name.starts_with(&self.pattern),
            PatternKind::Contains => qualified.contains(&self.pattern),
            PatternKind::Exact => table.name == self.pattern || qualified == self.pattern,
        }
    }
}

fn contains(patterns: &[&str]) -> Vec<NamePattern> {
    patterns
        .iter()
        .map(|pattern| NamePattern::new(PatternKind::Contains, pattern))
        .collect()
}

fn exact(patterns: &[&str]) -> Vec<NamePattern> {
    patterns
        .iter()
        .map(|pattern| NamePattern::new(PatternKind::Exact, pattern))
        .collect()
}

/// The ordered pattern tables driving [`TableCatalog::classify`]. The
/// defaults cover the temp-table, staging and reporting conventions of the
/// settlement scripts this engine was built against; callers replace them
/// wholesale through configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogRules {
    pub intermediate: Vec<NamePattern>,
    pub source: Vec<NamePattern>,
    pub target: Vec<NamePattern>,
}

impl Default for CatalogRules {
    fn default() -> Self {
        let mut intermediate = vec![NamePattern::new(PatternKind::Prefix, "#")];
        intermediate.extend(contains(&["temp", "work"]));
        intermediate.extend(exact(&[
            "stage", "x", "j", "a", "r", "scores", "feerule", "feecalc", "bal", "needcheck",
            "slice", "map", "src", "joinmap", "net",
        ]));
        Self {
            intermediate,
            source: contains(&["staging", "ref.", "raw", "input"]),
            target: contains(&["core.", "audit.", "ops.", "final"]),
        }
    }
}

/// Optional allow-lists from an external metadata source. Entries win over
/// every pattern rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableHints {
    pub source_tables: Vec<String>,
    pub target_tables: Vec<String>,
}

/// Classifies table names into lineage roles. Classification is pure: the
/// same name always yields the same category for the lifetime of a run.
#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    rules: CatalogRules,
    source_overrides: BTreeSet<String>,
    target_overrides: BTreeSet<String>,
}

impl TableCatalog {
    pub fn new(rules: CatalogRules, hints: &TableHints) -> Self {
        let normalize = |tables: &[String]| {
            tables
                .iter()
                .map(|name| TableRef::parse(name).qualified())
                .collect()
        };
        Self {
            rules,
            source_overrides: normalize(&hints.source_tables),
            target_overrides: normalize(&hints.target_tables),
        }
    }

    /// Ordered, deterministic categorization: allow-list overrides, then
    /// intermediate patterns, then source, then target, else `Unknown`.
    /// Intermediate patterns run before source/target ones because the naming
    /// conventions overlap (`staging_work` is a work table, not a source).
    pub fn classify(&self, table: &TableRef) -> Category {
        let qualified = table.qualified();
        if self.source_overrides.contains(&qualified) {
            return Category::Source;
        }
        if self.target_overrides.contains(&qualified) {
            return Category::Target;
        }
        for (patterns, category) in [
            (&self.rules.intermediate, Category::Intermediate),
            (&self.rules.source, Category::Source),
            (&self.rules.target, Category::Target),
        ] {
            if patterns.iter().any(|pattern| pattern.matches(table)) {
                return category;
            }
        }
        Category::Unknown
    }
}
