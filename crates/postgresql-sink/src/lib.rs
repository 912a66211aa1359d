//! PostgreSQL sink for cdc-replay.
//!
//! [`ReplaySink`] is the seam between statement synthesis and execution.
//! [`PostgresSink`] prepares each statement, converts the cast values to the
//! parameter types the server reports and executes it.

mod error;
mod params;
mod sink;
mod traits;

pub use error::{Result, SinkError};
pub use params::{to_sql_param, SqlNull};
pub use sink::PostgresSink;
pub use traits::ReplaySink;
