//! Core types for cdc-replay.
//!
//! This crate turns raw change-data-capture values into native values and
//! decides which columns identify a row:
//!
//! - [`SchemaRegistry`] - per-table [`FieldClassification`] loaded once at startup
//! - [`ValueCaster`] - schema-driven decoding into [`CastValue`]s
//! - [`resolve_identity`] - declared row identifier, else the before-image columns
//! - [`temporal`] - days / milliseconds / microseconds since epoch decoders
//! - [`ChangeRecord`] - one row mutation as delivered by a record source
//!
//! # Architecture
//!
//! ```text
//! replay-core (this crate)
//!    │
//!    ├─── replay-dml                 (statement synthesis, depends on replay-core)
//!    ├─── cdc-replay-jsonl-source    (produces ChangeRecords)
//!    └─── cdc-replay-postgresql-sink (binds CastValues)
//! ```
//!
//! # Example
//!
//! ```rust
//! use replay_core::{CastValue, SchemaRegistry, ValueCaster};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::from_yaml("users:\n  date_fields: [birthday]\n").unwrap();
//! let caster = ValueCaster::new(&registry);
//! let values = caster
//!     .cast("users", &["name", "birthday"], &[json!("Alice"), json!(1)])
//!     .unwrap();
//! assert_eq!(values[0], CastValue::Text("Alice".to_string()));
//! assert_eq!(values[1].as_date().unwrap().to_string(), "1970-01-02");
//! ```

pub mod cast;
pub mod epoch;
pub mod error;
pub mod identity;
pub mod record;
pub mod schema;
pub mod temporal;
pub mod values;

pub use cast::{cast_value, ValueCaster};
pub use error::{ReplayError, Result, TemporalError};
pub use identity::resolve_identity;
pub use record::{ChangeKind, ChangeRecord, RowImage};
pub use schema::{FieldClassification, FieldKind, RowIdentifier, SchemaError, SchemaRegistry, TableConfig};
pub use values::CastValue;
