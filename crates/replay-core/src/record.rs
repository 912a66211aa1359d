//! Change records handed over by the record source.

use crate::error::{ReplayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered column -> raw value mapping of one row image.
///
/// `serde_json` is built with `preserve_order`, so iteration follows the order
/// the producer wrote the columns in.
pub type RowImage = serde_json::Map<String, serde_json::Value>;

/// Kind of row mutation a change record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    /// Map a Debezium-style operation code.
    ///
    /// `c` (create) and `r` (snapshot read) both replay as inserts.
    pub fn from_op_code(op: &str) -> Option<Self> {
        match op {
            "c" | "r" | "i" | "insert" => Some(Self::Insert),
            "u" | "update" => Some(Self::Update),
            "d" | "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => f.write_str("INSERT"),
            Self::Update => f.write_str("UPDATE"),
            Self::Delete => f.write_str("DELETE"),
        }
    }
}

/// A single row mutation on a source table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeRecord {
    pub table: String,
    /// Operation declared by the producer, if any
    pub op: Option<ChangeKind>,
    pub before: RowImage,
    pub after: RowImage,
}

impl ChangeRecord {
    pub fn insert(table: impl Into<String>, after: RowImage) -> Self {
        Self {
            table: table.into(),
            op: Some(ChangeKind::Insert),
            before: RowImage::new(),
            after,
        }
    }

    pub fn update(table: impl Into<String>, before: RowImage, after: RowImage) -> Self {
        Self {
            table: table.into(),
            op: Some(ChangeKind::Update),
            before,
            after,
        }
    }

    pub fn delete(table: impl Into<String>, before: RowImage) -> Self {
        Self {
            table: table.into(),
            op: Some(ChangeKind::Delete),
            before,
            after: RowImage::new(),
        }
    }

    /// Kind of mutation to replay.
    ///
    /// The declared operation wins. Without one, the kind is inferred from the
    /// images: only `after` is an insert, only `before` is a delete, both is an
    /// update.
    pub fn kind(&self) -> Result<ChangeKind> {
        if let Some(op) = self.op {
            return Ok(op);
        }
        match (self.before.is_empty(), self.after.is_empty()) {
            (true, false) => Ok(ChangeKind::Insert),
            (false, true) => Ok(ChangeKind::Delete),
            (false, false) => Ok(ChangeKind::Update),
            (true, true) => Err(ReplayError::EmptyRecord {
                table: self.table.clone(),
            }),
        }
    }

    pub fn before_keys(&self) -> Vec<&str> {
        self.before.keys().map(String::as_str).collect()
    }

    pub fn after_keys(&self) -> Vec<&str> {
        self.after.keys().map(String::as_str).collect()
    }
}
