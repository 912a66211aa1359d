//! Parameterized DML synthesis for change replay.
//!
//! [`DmlSynthesizer`] turns a [`replay_core::ChangeRecord`] into a
//! [`BoundStatement`]: statement text from a [`SqlDialect`] plus the cast
//! values, ordered to match the placeholders.

pub mod dialect;
pub mod statement;
pub mod synth;

pub use dialect::{FormatDialect, MySqlDialect, PostgresDialect, Predicate, SqlDialect};
pub use statement::{Binding, BoundStatement, Statement};
pub use synth::DmlSynthesizer;

/// Dialect selector for configuration and command-line use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialectKind {
    #[default]
    Postgres,
    MySql,
    Format,
}

impl DialectKind {
    pub fn dialect(self) -> &'static dyn SqlDialect {
        match self {
            DialectKind::Postgres => &PostgresDialect,
            DialectKind::MySql => &MySqlDialect,
            DialectKind::Format => &FormatDialect,
        }
    }
}

impl std::str::FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DialectKind::Postgres),
            "mysql" => Ok(DialectKind::MySql),
            "format" => Ok(DialectKind::Format),
            other => Err(format!(
                "unknown dialect '{other}', expected postgres, mysql or format"
            )),
        }
    }
}
