//! Synthesized statements and their parameter slots.

use replay_core::{CastValue, ChangeKind, ChangeRecord, ReplayError, Result, ValueCaster};
use serde_json::{json, Value};

/// Where the value of one placeholder comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Column of the after image (INSERT values, UPDATE SET list)
    After(String),
    /// Column of the before image (UPDATE/DELETE predicate)
    Before(String),
}

impl Binding {
    pub fn column(&self) -> &str {
        match self {
            Binding::After(column) | Binding::Before(column) => column,
        }
    }

    fn image_name(&self) -> &'static str {
        match self {
            Binding::After(_) => "after",
            Binding::Before(_) => "before",
        }
    }
}

/// Statement text plus one binding per placeholder, in text order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: ChangeKind,
    pub schema: String,
    pub table: String,
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl Statement {
    pub fn placeholder_count(&self) -> usize {
        self.bindings.len()
    }

    /// Column names bound to placeholders, in placeholder order.
    pub fn bound_columns(&self) -> Vec<&str> {
        self.bindings.iter().map(Binding::column).collect()
    }

    /// Pull the raw value of every slot out of `record` and cast them.
    ///
    /// A slot whose column is missing from its image fails with
    /// [`ReplayError::MissingColumnValue`].
    pub fn bind(self, record: &ChangeRecord, caster: &ValueCaster<'_>) -> Result<BoundStatement> {
        let mut columns = Vec::with_capacity(self.bindings.len());
        let mut raw = Vec::with_capacity(self.bindings.len());

        for binding in &self.bindings {
            let image = match binding {
                Binding::After(_) => &record.after,
                Binding::Before(_) => &record.before,
            };
            let value = image
                .get(binding.column())
                .ok_or_else(|| ReplayError::MissingColumnValue {
                    table: self.table.clone(),
                    column: binding.column().to_string(),
                    image: binding.image_name(),
                })?;
            columns.push(binding.column());
            raw.push(value.clone());
        }

        let params = caster.cast(&self.table, &columns, &raw)?;
        Ok(BoundStatement {
            statement: self,
            params,
        })
    }
}

/// A statement with its values cast and ordered for positional binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub statement: Statement,
    pub params: Vec<CastValue>,
}

impl BoundStatement {
    pub fn sql(&self) -> &str {
        &self.statement.sql
    }

    /// JSON rendering used for dry runs and logs.
    pub fn to_json(&self) -> Value {
        json!({
            "kind": self.statement.kind,
            "table": self.statement.table,
            "sql": self.statement.sql,
            "params": self.params.iter().map(CastValue::to_json).collect::<Vec<_>>(),
        })
    }
}
