use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;
use clap::Parser as ClapParser;
use clap::Subcommand;
use lintra::bridge::{BridgeConfig, propose_bridges};
use lintra::catalog::{CatalogRules, TableCatalog, TableHints};
use lintra::graph::{ColumnRef, EdgeRecord, LineageGraph, MergeReport};
use lintra::report::{FieldLineageEvent, MappingRow, field_lineage_events, mapping_rows};
use lintra::resolve::{ResolveOptions, resolve, source_columns};
use lintra::trace::TraceConfig;
use lintra::validate::{Expectation, ExpectationResult, ValidationConfig, validate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(clap::Parser)]
#[command(name = "lintra")]
#[command(about = "End-to-end column lineage resolver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve end-to-end mappings from extracted edge batches.
    Resolve(ResolveCommand),
}

#[derive(clap::Args)]
struct ResolveCommand {
    /// Path to the JSON file with per-statement edge batches.
    #[arg(short, long)]
    edges: PathBuf,
    /// Path to a JSON file with source/target table allow-lists.
    #[arg(long)]
    hints: Option<PathBuf>,
    /// Path to a JSON file with expected source/target mappings to validate.
    #[arg(long)]
    expected: Option<PathBuf>,
    /// Path to the original script, used for domain corroboration when
    /// validating expectations.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Path to a TOML file overriding catalog, bridge, trace and validation
    /// configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only resolve these start columns (schema.table.column), instead of
    /// every column of the source-category tables.
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,
    /// Skip the bridging heuristics entirely.
    #[arg(long)]
    no_bridges: bool,
    /// Include column-level field lineage events in the output.
    #[arg(long)]
    events: bool,
    /// Pretty-print the output JSON.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Config {
    catalog: CatalogRules,
    bridge: BridgeConfig,
    trace: TraceConfig,
    validate: ValidationConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct EdgeBatch {
    statement_id: Option<String>,
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
struct EdgeBatchFile {
    batches: Vec<EdgeBatch>,
}

#[derive(Serialize)]
struct RunSummary {
    statements: usize,
    tables: usize,
    columns: usize,
    edges: usize,
    records_rejected: usize,
    bridges_proposed: usize,
    mappings: usize,
}

#[derive(Serialize)]
struct ResolveOutput {
    summary: RunSummary,
    mappings: Vec<MappingRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    events: Option<Vec<FieldLineageEvent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expectations: Option<Vec<ExpectationResult>>,
}

fn read_to_string(path: &PathBuf, what: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|_| anyhow!("Failed to read {} file: {}", what, path.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf, what: &str) -> anyhow::Result<T> {
    serde_json::from_str(&read_to_string(path, what)?).map_err(|err| {
        anyhow!(
            "Failed to parse JSON {} in file {} due to error: {}",
            what,
            path.display(),
            err
        )
    })
}

fn run_resolve(command: &ResolveCommand) -> anyhow::Result<()> {
    let config: Config = match &command.config {
        Some(path) => toml::from_str(&read_to_string(path, "config")?).map_err(|err| {
            anyhow!(
                "Failed to parse TOML config in file {} due to error: {}",
                path.display(),
                err
            )
        })?,
        None => Config::default(),
    };

    let batch_file: EdgeBatchFile = read_json(&command.edges, "edge batch")?;

    // Per-statement batches are independent, so the per-batch graphs are
    // built on worker threads and union-merged afterwards.
    let batch_graphs: Vec<(LineageGraph, MergeReport)> = batch_file
        .batches
        .par_iter()
        .map(|batch| {
            let mut graph = LineageGraph::default();
            let report = graph.merge_batch(&batch.edges, batch.statement_id.as_deref());
            (graph, report)
        })
        .collect();

    let mut graph = LineageGraph::default();
    let mut ingest = MergeReport::default();
    for (batch_graph, report) in batch_graphs {
        graph.merge(batch_graph);
        ingest.absorb(report);
    }
    log::info!(
        "Ingested {} statements: {} columns, {} edges, {} records rejected",
        batch_file.batches.len(),
        graph.column_count(),
        graph.edge_count(),
        ingest.records_rejected
    );

    let hints: TableHints = match &command.hints {
        Some(path) => read_json(path, "table hints")?,
        None => TableHints::default(),
    };
    let catalog = TableCatalog::new(config.catalog.clone(), &hints);

    let bridges = if command.no_bridges {
        vec![]
    } else {
        propose_bridges(&graph, &catalog, &config.bridge)
    };

    let start_columns = if command.columns.is_empty() {
        source_columns(&graph, &catalog)
    } else {
        command
            .columns
            .iter()
            .map(|column| ColumnRef::parse(column))
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let options = ResolveOptions {
        trace: config.trace.clone(),
        parallel: true,
    };
    let mappings = resolve(&graph, &catalog, &start_columns, Some(&bridges), &options);

    let expectations = match &command.expected {
        Some(path) => {
            let expected: Vec<Expectation> = read_json(path, "expected mappings")?;
            let script_text = match &command.script {
                Some(script_path) => Some(read_to_string(script_path, "script")?),
                None => None,
            };
            Some(validate(
                &mappings,
                &expected,
                script_text.as_deref(),
                &config.validate,
            ))
        }
        None => None,
    };

    let output = ResolveOutput {
        summary: RunSummary {
            statements: batch_file.batches.len(),
            tables: graph.tables().len(),
            columns: graph.column_count(),
            edges: graph.edge_count(),
            records_rejected: ingest.records_rejected,
            bridges_proposed: bridges.len(),
            mappings: mappings.len(),
        },
        mappings: mapping_rows(&mappings),
        events: command.events.then(|| field_lineage_events(&mappings)),
        expectations,
    };

    let out_str = if command.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", out_str);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let now = Instant::now();

    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Resolve(resolve_command) => run_resolve(resolve_command)?,
    }

    let elapsed = now.elapsed();
    log::info!("Elapsed: {:.2?}", elapsed);

    Ok(())
}
