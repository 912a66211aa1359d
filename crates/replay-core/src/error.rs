//! Error types for replay-core.

use crate::record::ChangeKind;
use thiserror::Error;

/// Failures of the temporal decoders, before table/column context is attached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemporalError {
    #[error("{value} {unit} since epoch is outside the representable calendar range")]
    OutOfRange { unit: &'static str, value: i64 },

    #[error("{millis} milliseconds since midnight is not a time of day")]
    NotTimeOfDay { millis: i64 },

    #[error("expected an integer encoding, got {found}")]
    NotAnInteger { found: String },

    #[error("unparseable timestamp: {input}")]
    Unparseable { input: String },
}

/// Errors raised while casting values or synthesizing statements.
///
/// All variants describe the shape of the data, so retrying the same record
/// reproduces the same error. Callers decide whether to skip, dead-letter or
/// abort.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("No schema configuration for table '{table}'")]
    UnknownTable { table: String },

    #[error("Table '{table}': {fields} field names but {values} values")]
    ArityMismatch {
        table: String,
        fields: usize,
        values: usize,
    },

    #[error("Invalid temporal value {raw} for column '{table}.{column}': {source}")]
    InvalidTemporalValue {
        table: String,
        column: String,
        raw: String,
        #[source]
        source: TemporalError,
    },

    #[error("Invalid binary encoding for column '{table}.{column}': {message}")]
    InvalidEncoding {
        table: String,
        column: String,
        message: String,
    },

    #[error("Table '{table}' declares no row identifier and the before image is empty")]
    NoIdentityAvailable { table: String },

    #[error("Refusing to build {kind} for table '{table}': no columns to write")]
    EmptyMutation { table: String, kind: ChangeKind },

    #[error("Change record for table '{table}' has neither a before nor an after image")]
    EmptyRecord { table: String },

    #[error("Column '{column}' has no value in the {image} image of table '{table}'")]
    MissingColumnValue {
        table: String,
        column: String,
        image: &'static str,
    },

    #[error("SQL generation failed for table '{table}': {message}")]
    Sql { table: String, message: String },
}

impl ReplayError {
    /// Table the failing record belongs to.
    pub fn table(&self) -> &str {
        match self {
            Self::UnknownTable { table }
            | Self::ArityMismatch { table, .. }
            | Self::InvalidTemporalValue { table, .. }
            | Self::InvalidEncoding { table, .. }
            | Self::NoIdentityAvailable { table }
            | Self::EmptyMutation { table, .. }
            | Self::EmptyRecord { table }
            | Self::MissingColumnValue { table, .. }
            | Self::Sql { table, .. } => table,
        }
    }

    /// Always false: every variant recurs identically on retry.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type alias for replay-core operations.
pub type Result<T> = std::result::Result<T, ReplayError>;
