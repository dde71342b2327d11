//! # lintra
//!
//! A library for resolving end-to-end, column-level lineage from the
//! per-statement column mappings a SQL extractor produces over
//! data-transformation scripts.
//!
//! # Features
//!
//! - Merge per-statement edge batches from any number of extractor passes
//!   into one lineage graph with idempotent set semantics.
//! - Categorize the tables a script touches (source, intermediate, target)
//!   with ordered pattern rules and external allow-lists.
//! - Trace every simple path from an origin column to the final target
//!   columns through arbitrarily many temp/staging hops, cycle-safe and
//!   depth-bounded.
//! - Bridge gaps left by incomplete extraction with name-match and synonym
//!   heuristics, kept at a lower confidence tier than extracted lineage.
//! - Score resolved mappings against expected source/target pairs with
//!   configurable evidence weights.
//! - Export flat mapping tables or column-level field-lineage events.
//!
//! # Example
//!
//! ```rust,no_run
//! use lintra::{
//!     bridge::{BridgeConfig, propose_bridges},
//!     catalog::{CatalogRules, TableCatalog, TableHints},
//!     graph::{ColumnRef, Edge, LineageGraph},
//!     resolve::{ResolveOptions, resolve, source_columns},
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     env_logger::init();
//!
//!     let mut graph = LineageGraph::default();
//!     graph.add_edge(
//!         Edge::extracted(
//!             ColumnRef::parse("staging.transactions.srcid")?,
//!             ColumnRef::parse("#txnmap.srcid")?,
//!         )
//!         .with_statement("stmt-1"),
//!     )?;
//!     graph.add_edge(
//!         Edge::extracted(
//!             ColumnRef::parse("#txnmap.srcid")?,
//!             ColumnRef::parse("core.ledgerfinal.idempotencykey")?,
//!         )
//!         .with_statement("stmt-2"),
//!     )?;
//!
//!     let catalog = TableCatalog::new(CatalogRules::default(), &TableHints::default());
//!     let bridges = propose_bridges(&graph, &catalog, &BridgeConfig::default());
//!     let starts = source_columns(&graph, &catalog);
//!     let mappings = resolve(
//!         &graph,
//!         &catalog,
//!         &starts,
//!         Some(&bridges),
//!         &ResolveOptions::default(),
//!     );
//!     for mapping in &mappings {
//!         println!(
//!             "{} -> {} ({})",
//!             mapping.source, mapping.target, mapping.confidence
//!         );
//!     }
//!     Ok(())
//! }
//! ```
pub mod bridge;
pub mod catalog;
pub mod graph;
pub mod report;
pub mod resolve;
pub mod trace;
pub mod validate;
