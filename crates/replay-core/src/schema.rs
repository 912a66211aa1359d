//! Per-table field classification and the registry that holds it.
//!
//! The registry is loaded once at startup from a static configuration file
//! shaped as a mapping from table name to field lists:
//!
//! ```yaml
//! users:
//!   date_fields: [birthday]
//!   datetime_micro_fields: [updated_at]
//!   binary_fields: [avatar]
//!   set_fields: [roles]
//!   row_identifier: [id]
//! ```
//!
//! Each field list is folded into a single `field name -> FieldKind` map when
//! the table is loaded, so casting a value is one hash lookup. The registry is
//! never mutated after construction and can be shared freely between threads.

use crate::error::{ReplayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for loading schema configuration.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading the configuration file
    #[error("Failed to read schema configuration: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    /// File extension is not one of yaml, yml, json, toml
    #[error("Unsupported schema configuration format: {path}")]
    UnsupportedFormat { path: String },

    /// The same field is listed under two classifications
    #[error("Field '{field}' of table '{table}' is listed as both {first} and {second}")]
    ConflictingClassification {
        table: String,
        field: String,
        first: FieldKind,
        second: FieldKind,
    },

    #[error("Table '{table}' has an empty field name in {kind}")]
    EmptyFieldName { table: String, kind: FieldKind },

    #[error("Table '{table}' has an empty column name in row_identifier")]
    EmptyRowIdentifierColumn { table: String },
}

// ============================================================================
// Field kinds
// ============================================================================

/// How a raw CDC value of a field is turned into a native value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Days since epoch
    Date,
    /// Milliseconds since midnight
    Time,
    /// Milliseconds since epoch
    DateTimeMilli,
    /// Microseconds since epoch
    DateTimeMicro,
    /// Milliseconds since epoch
    Timestamp,
    /// Base64 text
    Binary,
    /// Comma-joined members, kept as text
    Set,
    Passthrough,
}

impl FieldKind {
    /// Name of the configuration list this kind is read from.
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Date => "date_fields",
            Self::Time => "time_fields",
            Self::DateTimeMilli => "datetime_milli_fields",
            Self::DateTimeMicro => "datetime_micro_fields",
            Self::Timestamp => "timestamp_fields",
            Self::Binary => "binary_fields",
            Self::Set => "set_fields",
            Self::Passthrough => "unclassified",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

// ============================================================================
// Configuration (serde side)
// ============================================================================

/// A declared row identifier: either one column or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowIdentifier {
    Column(String),
    Columns(Vec<String>),
}

impl RowIdentifier {
    /// Declared columns; an empty string or list declares none.
    fn into_columns(self) -> Vec<String> {
        match self {
            Self::Column(column) if column.is_empty() => Vec::new(),
            Self::Column(column) => vec![column],
            Self::Columns(columns) => columns,
        }
    }
}

/// One table entry of the static configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    #[serde(default)]
    pub date_fields: Vec<String>,
    #[serde(default)]
    pub time_fields: Vec<String>,
    #[serde(default)]
    pub datetime_milli_fields: Vec<String>,
    #[serde(default)]
    pub datetime_micro_fields: Vec<String>,
    #[serde(default)]
    pub timestamp_fields: Vec<String>,
    #[serde(default)]
    pub binary_fields: Vec<String>,
    #[serde(default)]
    pub set_fields: Vec<String>,
    #[serde(default)]
    pub row_identifier: Option<RowIdentifier>,
}

impl TableConfig {
    fn classified(&self) -> [(FieldKind, &[String]); 7] {
        [
            (FieldKind::Date, self.date_fields.as_slice()),
            (FieldKind::Time, self.time_fields.as_slice()),
            (FieldKind::DateTimeMilli, self.datetime_milli_fields.as_slice()),
            (FieldKind::DateTimeMicro, self.datetime_micro_fields.as_slice()),
            (FieldKind::Timestamp, self.timestamp_fields.as_slice()),
            (FieldKind::Binary, self.binary_fields.as_slice()),
            (FieldKind::Set, self.set_fields.as_slice()),
        ]
    }
}

// ============================================================================
// Loaded classification
// ============================================================================

/// Field classification and row identifier of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldClassification {
    table: String,
    kinds: HashMap<String, FieldKind>,
    row_identifier: Option<Vec<String>>,
}

impl FieldClassification {
    /// Build the classification of `table` from its configuration entry.
    pub fn from_config(
        table: impl Into<String>,
        config: TableConfig,
    ) -> std::result::Result<Self, SchemaError> {
        let table = table.into();
        let mut kinds = HashMap::new();

        for (kind, fields) in config.classified() {
            for field in fields {
                if field.is_empty() {
                    return Err(SchemaError::EmptyFieldName { table, kind });
                }
                match kinds.get(field).copied() {
                    Some(first) if first != kind => {
                        return Err(SchemaError::ConflictingClassification {
                            table,
                            field: field.clone(),
                            first,
                            second: kind,
                        });
                    }
                    Some(_) => {}
                    None => {
                        kinds.insert(field.clone(), kind);
                    }
                }
            }
        }

        let row_identifier = config
            .row_identifier
            .map(RowIdentifier::into_columns)
            .filter(|columns| !columns.is_empty());
        if row_identifier
            .iter()
            .flatten()
            .any(|column| column.is_empty())
        {
            return Err(SchemaError::EmptyRowIdentifierColumn { table });
        }

        Ok(Self {
            table,
            kinds,
            row_identifier,
        })
    }

    /// Name of the table this classification describes.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Kind of `field`; unlisted fields are [`FieldKind::Passthrough`].
    pub fn kind_of(&self, field: &str) -> FieldKind {
        self.kinds
            .get(field)
            .copied()
            .unwrap_or(FieldKind::Passthrough)
    }

    /// Declared row identifier, if one was configured and is non-empty.
    pub fn row_identifier(&self) -> Option<&[String]> {
        self.row_identifier.as_deref()
    }

    /// Fields listed under `kind`, sorted by name.
    pub fn fields_of(&self, kind: FieldKind) -> Vec<&str> {
        let mut fields: Vec<&str> = self
            .kinds
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(name, _)| name.as_str())
            .collect();
        fields.sort_unstable();
        fields
    }

    /// Number of classified (non-passthrough) fields.
    pub fn classified_count(&self) -> usize {
        self.kinds.len()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable table name -> classification lookup.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: HashMap<String, FieldClassification>,
}

impl SchemaRegistry {
    /// Build a registry from configuration entries.
    pub fn from_tables<I, S>(tables: I) -> std::result::Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (S, TableConfig)>,
        S: Into<String>,
    {
        let tables = tables
            .into_iter()
            .map(|(name, config)| {
                let classification = FieldClassification::from_config(name, config)?;
                Ok((classification.table.clone(), classification))
            })
            .collect::<std::result::Result<HashMap<_, _>, SchemaError>>()?;

        tracing::debug!("Loaded schema configuration for {} tables", tables.len());
        Ok(Self { tables })
    }

    /// Load a configuration file, choosing the parser by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            _ => Err(SchemaError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Parse a YAML configuration.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, SchemaError> {
        let tables: BTreeMap<String, TableConfig> = serde_yaml::from_str(yaml)?;
        Self::from_tables(tables)
    }

    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> std::result::Result<Self, SchemaError> {
        let tables: BTreeMap<String, TableConfig> = serde_json::from_str(json)?;
        Self::from_tables(tables)
    }

    /// Parse a TOML configuration, one `[table]` section per table.
    pub fn from_toml(content: &str) -> std::result::Result<Self, SchemaError> {
        let tables: BTreeMap<String, TableConfig> = toml::from_str(content)?;
        Self::from_tables(tables)
    }

    /// Classification of `table`.
    pub fn classification_for(&self, table: &str) -> Result<&FieldClassification> {
        self.tables
            .get(table)
            .ok_or_else(|| ReplayError::UnknownTable {
                table: table.to_string(),
            })
    }

    /// Declared row identifier of `table`, `None` when none is declared.
    pub fn row_identifier_for(&self, table: &str) -> Result<Option<&[String]>> {
        Ok(self.classification_for(table)?.row_identifier())
    }

    /// All loaded classifications, sorted by table name.
    pub fn tables(&self) -> Vec<&FieldClassification> {
        let mut tables: Vec<&FieldClassification> = self.tables.values().collect();
        tables.sort_unstable_by(|a, b| a.table.cmp(&b.table));
        tables
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
