use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;

use crate::graph::TableRef;
use crate::resolve::{Confidence, Mapping};

/// One row of the flat mapping table export.
#[derive(Debug, Clone, Serialize)]
pub struct MappingRow {
    pub source: String,
    pub target: String,
    pub confidence: Confidence,
    pub path_length: usize,
}

pub fn mapping_rows(mappings: &[Mapping]) -> Vec<MappingRow> {
    mappings
        .iter()
        .map(|mapping| MappingRow {
            source: mapping.source.to_string(),
            target: mapping.target.to_string(),
            confidence: mapping.confidence,
            path_length: mapping.shortest_path_len(),
        })
        .collect()
}

/// Fixed-width text rendering of the mapping table for terminal reports.
pub fn render_mapping_table(mappings: &[Mapping]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<45} {:<45} {:<10} {}",
        "SOURCE", "TARGET", "CONF", "PATH"
    );
    let _ = writeln!(out, "{}", "-".repeat(108));
    for row in mapping_rows(mappings) {
        let _ = writeln!(
            out,
            "{:<45} {:<45} {:<10} {}",
            row.source, row.target, row.confidence, row.path_length
        );
    }
    out
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformationType {
    Direct,
    Indirect,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformationSubtype {
    Identity,
    Transformation,
    Aggregation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transformation {
    pub r#type: TransformationType,
    pub subtype: TransformationSubtype,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldInput {
    pub dataset: String,
    pub field: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldLineage {
    pub field: String,
    pub inputs: Vec<FieldInput>,
    pub transformation: Transformation,
}

/// Column-level field lineage for one target dataset: per output field, the
/// contributing input fields and a transformation descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct FieldLineageEvent {
    pub dataset: String,
    pub fields: Vec<FieldLineage>,
}

/// Builds one field-lineage record per target table out of the resolved
/// mappings, keeping the resolver's sort order. One hop with an unchanged
/// column name is an identity copy, one hop with a rename is a direct
/// transformation, anything longer is indirect; a field fed by several inputs
/// is reported as an aggregation.
pub fn field_lineage_events(mappings: &[Mapping]) -> Vec<FieldLineageEvent> {
    let mut by_target: IndexMap<&TableRef, IndexMap<&str, Vec<&Mapping>>> = IndexMap::new();
    for mapping in mappings {
        by_target
            .entry(&mapping.target.table)
            .or_default()
            .entry(mapping.target.name.as_str())
            .or_default()
            .push(mapping);
    }

    by_target
        .into_iter()
        .map(|(table, fields)| FieldLineageEvent {
            dataset: table.qualified(),
            fields: fields
                .into_iter()
                .map(|(field, contributing)| FieldLineage {
                    field: field.to_owned(),
                    inputs: contributing
                        .iter()
                        .map(|mapping| FieldInput {
                            dataset: mapping.source.table.qualified(),
                            field: mapping.source.name.clone(),
                        })
                        .collect(),
                    transformation: transformation_of(field, &contributing),
                })
                .collect(),
        })
        .collect()
}

fn transformation_of(field: &str, contributing: &[&Mapping]) -> Transformation {
    let hops = contributing
        .iter()
        .map(|mapping| mapping.shortest_path_len())
        .min()
        .unwrap_or(1);
    let r#type = if hops <= 1 {
        TransformationType::Direct
    } else {
        TransformationType::Indirect
    };

    if contributing.len() > 1 {
        return Transformation {
            r#type,
            subtype: TransformationSubtype::Aggregation,
            description: format!("{} input fields combined", contributing.len()),
        };
    }

    let mapping = contributing[0];
    if hops <= 1 && mapping.source.name == field {
        Transformation {
            r#type: TransformationType::Direct,
            subtype: TransformationSubtype::Identity,
            description: "direct column copy".to_owned(),
        }
    } else if hops <= 1 {
        Transformation {
            r#type: TransformationType::Direct,
            subtype: TransformationSubtype::Transformation,
            description: "direct column transformation".to_owned(),
        }
    } else {
        Transformation {
            r#type: TransformationType::Indirect,
            subtype: TransformationSubtype::Transformation,
            description: format!("multi-step transformation ({} steps)", hops),
        }
    }
}
