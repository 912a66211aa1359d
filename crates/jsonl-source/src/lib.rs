//! JSONL change record source for cdc-replay
//!
//! Reads one change record per line, either in a flat form or wrapped in a
//! Debezium-style envelope, and yields [`replay_core::ChangeRecord`]s.

mod envelope;
mod error;
mod reader;

pub use envelope::parse_record;
pub use error::{Result, SourceError};
pub use reader::{open_input, ChangeRecordReader, DEFAULT_BUFFER_SIZE};
