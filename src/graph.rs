use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// A `(schema, name)` table identity with case-normalized equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: normalize(schema),
            name: normalize(name),
        }
    }

    /// Parses `schema.name`. A bare name (e.g. the temp table `#stage`)
    /// yields an empty schema.
    pub fn parse(qualified: &str) -> Self {
        match qualified.rsplit_once('.') {
            Some((schema, name)) => Self::new(schema, name),
            None => Self::new("", qualified),
        }
    }

    pub fn qualified(&self) -> String {
        if self.schema.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// A `(table, name)` column identity, the unit of graph traversal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: TableRef,
    pub name: String,
}

impl ColumnRef {
    pub fn new(table: TableRef, name: &str) -> Self {
        Self {
            table,
            name: normalize(name),
        }
    }

    /// Parses `schema.table.column` (or `table.column` for schemaless
    /// temp tables).
    pub fn parse(qualified: &str) -> anyhow::Result<Self> {
        let (table, name) = qualified
            .rsplit_once('.')
            .ok_or(anyhow!("Column reference `{}` has no table part", qualified))?;
        Ok(Self::new(TableRef::parse(table), name))
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

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
pub enum Provenance {
    Extracted,
    Bridged,
}

/// A directed column-to-column lineage assertion. Edge identity for merge
/// purposes is `(from, to, provenance)`; statement ids only accumulate for
/// traceability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: ColumnRef,
    pub to: ColumnRef,
    pub provenance: Provenance,
    pub statement_id: Option<String>,
}

impl Edge {
    pub fn extracted(from: ColumnRef, to: ColumnRef) -> Self {
        Self {
            from,
            to,
            provenance: Provenance::Extracted,
            statement_id: None,
        }
    }

    pub fn bridged(from: ColumnRef, to: ColumnRef) -> Self {
        Self {
            from,
            to,
            provenance: Provenance::Bridged,
            statement_id: None,
        }
    }

    pub fn with_statement(mut self, statement_id: &str) -> Self {
        self.statement_id = Some(statement_id.to_owned());
        self
    }
}

/// One raw record of an extractor edge batch. All fields are optional so a
/// partially extracted statement can still be ingested record by record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeRecord {
    pub source_table: Option<String>,
    pub source_column: Option<String>,
    pub target_table: Option<String>,
    pub target_column: Option<String>,
    pub statement_id: Option<String>,
}

/// Ingestion outcome counters. Rejected records never abort a run; they are
/// reported here.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MergeReport {
    pub edges_added: usize,
    pub edges_duplicate: usize,
    pub records_rejected: usize,
}

impl MergeReport {
    pub fn absorb(&mut self, other: MergeReport) {
        self.edges_added += other.edges_added;
        self.edges_duplicate += other.edges_duplicate;
        self.records_rejected += other.records_rejected;
    }
}

#[derive(Debug, Clone, Default)]
struct EdgeData {
    provenances: BTreeSet<Provenance>,
    statements: BTreeSet<String>,
}

/// Directed multigraph of column nodes, merged from any number of extractor
/// edge batches. The forward adjacency is the edge store itself and the
/// reverse adjacency is maintained on every insert, so the two views cannot
/// diverge. All maps are ordered, which keeps iteration (and therefore every
/// downstream report) deterministic regardless of ingestion order.
#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    edges: BTreeMap<ColumnRef, BTreeMap<ColumnRef, EdgeData>>,
    reverse: BTreeMap<ColumnRef, BTreeSet<ColumnRef>>,
    columns: BTreeSet<ColumnRef>,
}

impl LineageGraph {
    /// Merges a single edge. Returns `Ok(true)` when the
    /// `(from, to, provenance)` triple is new, `Ok(false)` on an idempotent
    /// re-add, and an error when either endpoint is missing an identifier
    /// (a caller error: no placeholder node is ever inserted).
    pub fn add_edge(&mut self, edge: Edge) -> anyhow::Result<bool> {
        for (side, column) in [("from", &edge.from), ("to", &edge.to)] {
            if column.table.name.is_empty() || column.name.is_empty() {
                return Err(anyhow!(
                    "Edge `{}` endpoint has an empty table or column identifier: {:?}",
                    side,
                    column
                ));
            }
        }

        self.columns.insert(edge.from.clone());
        self.columns.insert(edge.to.clone());
        self.reverse
            .entry(edge.to.clone())
            .or_default()
            .insert(edge.from.clone());

        let data = self
            .edges
            .entry(edge.from)
            .or_default()
            .entry(edge.to)
            .or_default();
        if let Some(statement_id) = edge.statement_id {
            data.statements.insert(statement_id);
        }
        Ok(data.provenances.insert(edge.provenance))
    }

    /// Merges a batch of raw extractor records. Records with a missing table
    /// or column identifier are rejected one by one and counted, never
    /// inserted as placeholders.
    pub fn merge_batch(&mut self, records: &[EdgeRecord], statement_id: Option<&str>) -> MergeReport {
        let mut report = MergeReport::default();
        for record in records {
            let (Some(source_table), Some(source_column), Some(target_table), Some(target_column)) = (
                record.source_table.as_deref(),
                record.source_column.as_deref(),
                record.target_table.as_deref(),
                record.target_column.as_deref(),
            ) else {
                log::debug!("Rejecting edge record with missing identifiers: {:?}", record);
                report.records_rejected += 1;
                continue;
            };

            let mut edge = Edge::extracted(
                ColumnRef::new(TableRef::parse(source_table), source_column),
                ColumnRef::new(TableRef::parse(target_table), target_column),
            );
            edge.statement_id = record
                .statement_id
                .clone()
                .or(statement_id.map(str::to_owned));

            match self.add_edge(edge) {
                Ok(true) => report.edges_added += 1,
                Ok(false) => report.edges_duplicate += 1,
                Err(err) => {
                    log::debug!("Rejecting edge record: {}", err);
                    report.records_rejected += 1;
                }
            }
        }
        report
    }

    /// Unions another graph into this one. The merge is commutative and
    /// idempotent, so per-statement graphs built on worker threads can be
    /// combined in any order.
    pub fn merge(&mut self, other: LineageGraph) {
        for (from, targets) in other.edges {
            for (to, data) in targets {
                for provenance in data.provenances {
                    let edge = Edge {
                        from: from.clone(),
                        to: to.clone(),
                        provenance,
                        statement_id: None,
                    };
                    // Endpoints were validated when `other` was built.
                    let _ = self.add_edge(edge);
                }
                if let Some(edge_data) = self
                    .edges
                    .get_mut(&from)
                    .and_then(|targets| targets.get_mut(&to))
                {
                    edge_data.statements.extend(data.statements);
                }
            }
        }
    }

    pub fn forward(&self, column: &ColumnRef) -> impl Iterator<Item = &ColumnRef> {
        self.edges.get(column).into_iter().flat_map(|targets| targets.keys())
    }

    pub fn reverse(&self, column: &ColumnRef) -> impl Iterator<Item = &ColumnRef> {
        self.reverse.get(column).into_iter().flatten()
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnRef> {
        self.columns.iter()
    }

    pub fn tables(&self) -> BTreeSet<&TableRef> {
        self.columns.iter().map(|column| &column.table).collect()
    }

    pub fn has_edge(&self, from: &ColumnRef, to: &ColumnRef) -> bool {
        self.edges
            .get(from)
            .is_some_and(|targets| targets.contains_key(to))
    }

    pub fn has_edge_with(&self, from: &ColumnRef, to: &ColumnRef, provenance: Provenance) -> bool {
        self.edges
            .get(from)
            .and_then(|targets| targets.get(to))
            .is_some_and(|data| data.provenances.contains(&provenance))
    }

    /// Statement ids recorded for an edge, for traceability in reports and
    /// debugging.
    pub fn statements(&self, from: &ColumnRef, to: &ColumnRef) -> impl Iterator<Item = &str> {
        self.edges
            .get(from)
            .and_then(|targets| targets.get(to))
            .into_iter()
            .flat_map(|data| data.statements.iter().map(String::as_str))
    }

    /// Number of distinct `(from, to, provenance)` triples.
    pub fn edge_count(&self) -> usize {
        self.edges
            .values()
            .flat_map(|targets| targets.values())
            .map(|data| data.provenances.len())
            .sum()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
