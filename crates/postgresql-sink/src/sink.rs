//! PostgreSQL implementation of [`ReplaySink`].

use crate::error::SinkError;
use crate::params::to_sql_param;
use crate::traits::ReplaySink;
use anyhow::{Context, Result};
use replay_dml::BoundStatement;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Statement};
use tracing::debug;

/// Executes bound statements on a caller-owned PostgreSQL client.
///
/// Prepared statements are cached by SQL text; a replay stream repeats the
/// same few shapes per table.
pub struct PostgresSink {
    client: Client,
    prepared: Mutex<HashMap<String, Statement>>,
}

impl PostgresSink {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            prepared: Mutex::new(HashMap::new()),
        }
    }

    /// Connect without TLS and drive the connection on a background task.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .context("Failed to connect to PostgreSQL")?;

        // Spawn connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {e}");
            }
        });

        Ok(Self::new(client))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn prepare(&self, sql: &str) -> Result<Statement> {
        if let Some(statement) = self.cached(sql) {
            return Ok(statement);
        }
        let statement = self
            .client
            .prepare(sql)
            .await
            .with_context(|| format!("Failed to prepare: {sql}"))?;
        if let Ok(mut cache) = self.prepared.lock() {
            cache.insert(sql.to_string(), statement.clone());
        }
        Ok(statement)
    }

    fn cached(&self, sql: &str) -> Option<Statement> {
        self.prepared
            .lock()
            .ok()
            .and_then(|cache| cache.get(sql).cloned())
    }
}

#[async_trait::async_trait]
impl ReplaySink for PostgresSink {
    async fn apply(&self, bound: &BoundStatement) -> Result<u64> {
        let table = &bound.statement.table;
        let prepared = self.prepare(bound.sql()).await?;

        let types = prepared.params();
        if types.len() != bound.params.len() {
            return Err(SinkError::ParameterCount {
                table: table.clone(),
                expected: types.len(),
                actual: bound.params.len(),
            }
            .into());
        }

        let params = types
            .iter()
            .zip(&bound.params)
            .map(|(ty, value)| to_sql_param(value, ty))
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to bind parameters for table '{table}'"))?;
        let param_refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = self
            .client
            .execute(&prepared, &param_refs)
            .await
            .with_context(|| {
                format!(
                    "Failed to apply {} on table '{table}'",
                    bound.statement.kind
                )
            })?;
        debug!(
            "Applied {} on {}.{}: {} rows",
            bound.statement.kind, bound.statement.schema, table, rows
        );
        Ok(rows)
    }
}
