//! The replay loop: records in, statements applied.

use anyhow::{Context, Result};
use cdc_replay_jsonl_source::ChangeRecordReader;
use cdc_replay_postgresql_sink::ReplaySink;
use replay_dml::DmlSynthesizer;
use std::io::BufRead;
use tracing::{info, warn};

/// Counters reported at the end of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Statements handed to the sink
    pub applied: u64,
    /// Records dropped because they could not be read or synthesized
    pub skipped: u64,
    /// Rows the sink reported as affected
    pub rows_affected: u64,
}

/// Replay `records` in order.
///
/// With `skip_invalid`, records that fail to decode or synthesize are logged
/// and dropped; otherwise the first such record aborts the replay. Sink
/// failures always abort. Failures name the 1-based input line.
pub async fn replay_records<R, S>(
    mut records: ChangeRecordReader<R>,
    synthesizer: &DmlSynthesizer<'_>,
    sink: &S,
    skip_invalid: bool,
) -> Result<ReplayStats>
where
    R: BufRead,
    S: ReplaySink + ?Sized,
{
    let mut stats = ReplayStats::default();

    while let Some(record) = records.next() {
        let line = records.line_count();

        let record = match record {
            Ok(record) => record,
            Err(e) if skip_invalid && e.is_record_error() => {
                warn!("Skipping unreadable record: {e}");
                stats.skipped += 1;
                continue;
            }
            Err(e) => return Err(e).context("Failed to read change records"),
        };

        let bound = match synthesizer.synthesize(&record) {
            Ok(bound) => bound,
            Err(e) if skip_invalid => {
                warn!("Skipping record at line {line}: {e}");
                stats.skipped += 1;
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "Failed to synthesize record at line {line} for table '{}'",
                        record.table
                    )
                })
            }
        };

        stats.rows_affected += sink.apply(&bound).await?;
        stats.applied += 1;
    }

    info!(
        "Replay finished: {} applied, {} skipped, {} rows affected",
        stats.applied, stats.skipped, stats.rows_affected
    );
    Ok(stats)
}
