//! Sync core configuration.

use std::path::PathBuf;

use crate::schema::NameComparison;

/// Default initial size of the JSON reader buffer in bytes.
pub const DEFAULT_JSON_BUFFER_SIZE: usize = 4096;

/// Largest buffer the JSON reader may grow to while looking for one token.
pub const DEFAULT_JSON_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Default batch file rotation threshold in bytes.
pub const DEFAULT_BATCH_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Sync core configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Case rule applied when comparing table, schema and column names
    pub name_comparison: NameComparison,
    /// Initial JSON reader buffer size in bytes
    pub json_buffer_size: usize,
    /// Sanity ceiling for JSON reader buffer growth in bytes
    pub json_max_buffer_size: usize,
    /// Batch part size after which the batch writer rotates to a new file
    pub batch_size_bytes: u64,
    /// Directory holding batch part files
    pub batch_directory: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            name_comparison: NameComparison::OrdinalIgnoreCase,
            json_buffer_size: DEFAULT_JSON_BUFFER_SIZE,
            json_max_buffer_size: DEFAULT_JSON_MAX_BUFFER_SIZE,
            batch_size_bytes: DEFAULT_BATCH_SIZE_BYTES,
            batch_directory: PathBuf::from("./batches"),
        }
    }
}
