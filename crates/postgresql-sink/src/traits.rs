//! ReplaySink trait definition.

use anyhow::Result;
use replay_dml::BoundStatement;

/// Trait for applying synthesized statements to a target database.
///
/// Implementations execute one statement per call with its parameters bound
/// positionally. Ordering, batching and retries belong to the caller.
#[async_trait::async_trait]
pub trait ReplaySink: Send + Sync {
    /// Execute `statement` and return the number of rows it affected.
    async fn apply(&self, statement: &BoundStatement) -> Result<u64>;
}
