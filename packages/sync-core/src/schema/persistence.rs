//! Schema document persistence.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::comparison::NameComparison;
use super::set::SyncSet;
use crate::error::{SyncError, SyncResult};
use crate::io_utils::{classify_io_error, write_atomic};

impl SyncSet {
    /// Saves the schema (tables, relations, filters; no rows) as pretty JSON.
    ///
    /// # Arguments
    /// * `path` - Destination file; written atomically
    ///
    /// # Returns
    /// `Result<(), SyncError>` indicating success or failure.
    pub fn save_schema(&self, path: &Path) -> SyncResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SyncError::SerializationError(e.to_string()))?;
        write_atomic(path, json.as_bytes())?;
        debug!(
            "Saved schema with {} tables to {}",
            self.tables.len(),
            path.display()
        );
        Ok(())
    }

    /// Loads a schema saved with [`SyncSet::save_schema`] and ensures it.
    pub fn load_schema(path: &Path) -> SyncResult<SyncSet> {
        Self::load_schema_with(path, NameComparison::default())
    }

    /// Loads a schema using an explicit name comparison rule.
    pub fn load_schema_with(path: &Path, comparison: NameComparison) -> SyncResult<SyncSet> {
        let contents = fs::read_to_string(path)
            .map_err(|e| classify_io_error(e, "Failed to read schema file"))?;
        let mut set: SyncSet = serde_json::from_str(&contents)
            .map_err(|e| SyncError::SerializationError(format!("Failed to parse schema: {}", e)))?;
        set.set_comparison(comparison);
        set.ensure_schema()?;
        debug!(
            "Loaded schema with {} tables from {}",
            set.tables.len(),
            path.display()
        );
        Ok(set)
    }
}
