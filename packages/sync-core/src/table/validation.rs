//! Validation methods for table schema and rows.

use super::columns::SyncColumns;
use super::row::SyncRow;
use crate::error::{SyncError, SyncResult};

/// Validates that every primary key name matches a column.
///
/// # Arguments
/// * `table` - Full table name used in the error
/// * `columns` - Column collection of the table
/// * `primary_keys` - Primary key names
///
/// # Returns
/// `Result<(), SyncError>` indicating success or the first unknown key.
pub(crate) fn validate_primary_keys(
    table: &str,
    columns: &SyncColumns,
    primary_keys: &[String],
) -> SyncResult<()> {
    for key in primary_keys {
        if !columns.contains(key) {
            return Err(SyncError::PrimaryKeyNotFound {
                table: table.to_string(),
                key: key.clone(),
            });
        }
    }
    Ok(())
}

/// Validates that ordinals are contiguous from 0.
pub(crate) fn validate_ordinals(table: &str, columns: &SyncColumns) -> SyncResult<()> {
    for (index, column) in columns.iter().enumerate() {
        if column.ordinal() != index {
            return Err(SyncError::OrdinalOutOfRange {
                column: format!("{}.{}", table, column.column_name),
                position: column.ordinal(),
                len: columns.len(),
            });
        }
    }
    Ok(())
}

/// Validates that a row carries one slot per column.
pub(crate) fn validate_row_width(
    table: &str,
    columns: &SyncColumns,
    row: &SyncRow,
) -> SyncResult<()> {
    if row.len() != columns.len() {
        return Err(SyncError::ColumnCountMismatch {
            table: table.to_string(),
            expected: columns.len(),
            got: row.len(),
        });
    }
    Ok(())
}
