//! Schema-agnostic tabular data model and streaming batch serialization.
//!
//! Provides the sync table/row/column model, schema sets with relations
//! and filters, a resumable byte-level JSON tokenizer, and the batch file
//! serializer used to move change sets to and from disk row by row.

pub mod config;
pub mod error;
pub mod io_utils;
pub mod json;
pub mod schema;
pub mod serialization;
pub mod table;
pub mod types;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use json::{JsonReader, JsonTokenType, JsonWriter};
pub use schema::{NameComparison, SyncSet};
pub use serialization::{ArrayJsonConverter, BatchInfo, BatchWriter, LocalJsonSerializer};
pub use table::{RowState, SyncColumn, SyncRow, SyncTable};
pub use types::{SyncValue, TypeCode};
