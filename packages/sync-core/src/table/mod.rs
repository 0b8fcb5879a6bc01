//! Tabular data model: columns, rows and tables.

mod column;
mod columns;
mod reader;
mod row;
mod rows;
#[allow(clippy::module_inception)]
mod table;
pub(crate) mod validation;

pub use column::SyncColumn;
pub use columns::SyncColumns;
pub use reader::{MemoryRecordReader, RecordReader};
pub use row::{RowState, SyncRow, MIN_CAPACITY, ROW_GROWTH};
pub use rows::{compare_key_values, SyncRows};
pub use table::SyncTable;
