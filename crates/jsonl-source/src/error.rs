//! Error types for reading change records.

use thiserror::Error;

/// Errors raised while reading change records. Line numbers are 1-based.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error reading line {line}: {source}")]
    ReadLine {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing JSON at line {line}: {source}")]
    InvalidJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid change record at line {line}: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error("Unsupported operation '{op}' at line {line}")]
    UnknownOperation { line: usize, op: String },
}

impl SourceError {
    /// Line the error occurred on, if it is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            SourceError::Io(_) => None,
            SourceError::ReadLine { line, .. }
            | SourceError::InvalidJson { line, .. }
            | SourceError::InvalidRecord { line, .. }
            | SourceError::UnknownOperation { line, .. } => Some(*line),
        }
    }

    /// True when the line itself is malformed and the rest of the input may
    /// still be readable.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            SourceError::InvalidJson { .. }
                | SourceError::InvalidRecord { .. }
                | SourceError::UnknownOperation { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
