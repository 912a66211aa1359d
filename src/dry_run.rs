//! Sink that prints statements instead of executing them.

use anyhow::{anyhow, Context, Result};
use cdc_replay_postgresql_sink::ReplaySink;
use replay_dml::BoundStatement;
use std::io::Write;
use std::sync::Mutex;

/// Writes each statement and its parameters as one JSON line.
pub struct DryRunSink<W> {
    out: Mutex<W>,
}

impl DryRunSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> DryRunSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|_| anyhow!("dry-run output lock poisoned"))
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> ReplaySink for DryRunSink<W> {
    async fn apply(&self, statement: &BoundStatement) -> Result<u64> {
        let line = serde_json::to_string(&statement.to_json())?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("dry-run output lock poisoned"))?;
        writeln!(out, "{line}").context("Failed to write dry-run output")?;
        Ok(0)
    }
}
