//! Schema configuration summary for `check-schema`.

use replay_core::{FieldKind, SchemaRegistry};
use tracing::info;

const CLASSIFIED_KINDS: [FieldKind; 7] = [
    FieldKind::Date,
    FieldKind::Time,
    FieldKind::DateTimeMilli,
    FieldKind::DateTimeMicro,
    FieldKind::Timestamp,
    FieldKind::Binary,
    FieldKind::Set,
];

/// What the registry knows about one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub table: String,
    /// Classified fields per kind, kinds without fields omitted
    pub fields: Vec<(FieldKind, Vec<String>)>,
    pub row_identifier: Option<Vec<String>>,
}

/// Summarize every table of `registry`, sorted by table name.
pub fn summarize(registry: &SchemaRegistry) -> Vec<TableSummary> {
    registry
        .tables()
        .into_iter()
        .map(|classification| TableSummary {
            table: classification.table().to_string(),
            fields: CLASSIFIED_KINDS
                .iter()
                .filter_map(|kind| {
                    let fields = classification.fields_of(*kind);
                    (!fields.is_empty())
                        .then(|| (*kind, fields.into_iter().map(str::to_string).collect()))
                })
                .collect(),
            row_identifier: classification.row_identifier().map(<[String]>::to_vec),
        })
        .collect()
}

/// Log the summary of every table.
pub fn log_summary(summaries: &[TableSummary]) {
    info!("Schema configuration defines {} tables", summaries.len());
    for summary in summaries {
        let identity = match &summary.row_identifier {
            Some(columns) => columns.join(", "),
            None => "<before image>".to_string(),
        };
        info!("Table '{}': row identifier {}", summary.table, identity);
        for (kind, fields) in &summary.fields {
            info!("  {}: {}", kind, fields.join(", "));
        }
    }
}
