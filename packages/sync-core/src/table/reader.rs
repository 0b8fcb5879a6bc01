//! Forward-only record source used to populate a table.

use crate::error::{SyncError, SyncResult};
use crate::types::{SyncValue, TypeCode};

/// Generic forward-only reader over a provider result set.
///
/// Field metadata is available before the first call to [`RecordReader::read`].
pub trait RecordReader {
    /// Number of fields per record.
    fn field_count(&self) -> usize;

    /// Name of the field at `index`.
    fn field_name(&self, index: usize) -> &str;

    /// Declared type of the field at `index`.
    fn field_type(&self, index: usize) -> TypeCode;

    /// Advances to the next record; returns false when exhausted.
    fn read(&mut self) -> SyncResult<bool>;

    /// Value of the field at `index` in the current record.
    fn value(&self, index: usize) -> SyncResult<SyncValue>;
}

/// Record reader over in-memory records.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordReader {
    fields: Vec<(String, TypeCode)>,
    records: Vec<Vec<SyncValue>>,
    current: Option<usize>,
}

impl MemoryRecordReader {
    /// Creates a reader with the given field names and types.
    pub fn new(fields: Vec<(String, TypeCode)>) -> Self {
        Self {
            fields,
            records: Vec::new(),
            current: None,
        }
    }

    /// Appends a record; values are positional by field.
    pub fn push(&mut self, record: Vec<SyncValue>) -> &mut Self {
        self.records.push(record);
        self
    }

    fn current_record(&self) -> SyncResult<&Vec<SyncValue>> {
        self.current
            .and_then(|i| self.records.get(i))
            .ok_or(SyncError::StreamNotOpen)
    }
}

impl RecordReader for MemoryRecordReader {
    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn field_name(&self, index: usize) -> &str {
        self.fields.get(index).map(|(n, _)| n.as_str()).unwrap_or("")
    }

    fn field_type(&self, index: usize) -> TypeCode {
        self.fields
            .get(index)
            .map(|(_, t)| *t)
            .unwrap_or(TypeCode::Object)
    }

    fn read(&mut self) -> SyncResult<bool> {
        let next = self.current.map_or(0, |i| i + 1);
        self.current = Some(next.min(self.records.len()));
        Ok(next < self.records.len())
    }

    fn value(&self, index: usize) -> SyncResult<SyncValue> {
        Ok(self
            .current_record()?
            .get(index)
            .cloned()
            .unwrap_or(SyncValue::Null))
    }
}
