//! Row collection with primary key lookup.

use super::row::SyncRow;
use super::table::SyncTable;
use crate::error::{SyncError, SyncResult};
use crate::types::SyncValue;

/// Ordered rows of one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncRows {
    rows: Vec<SyncRow>,
}

impl SyncRows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row.
    pub fn push(&mut self, row: SyncRow) {
        self.rows.push(row);
    }

    /// Removes and returns the row at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<SyncRow> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SyncRow> {
        self.rows.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SyncRow> {
        self.rows.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SyncRow> {
        self.rows.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SyncRow> {
        self.rows.iter_mut()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Finds the first row whose primary key matches `criteria`.
    ///
    /// # Arguments
    /// * `table` - Table describing the rows (primary keys and column types)
    /// * `criteria` - Key values in primary key column order (see
    ///   [`SyncTable::primary_key_columns`])
    ///
    /// # Returns
    /// `PrimaryKeyCountMismatch` when `criteria` does not carry one value per key.
    pub fn find_by_primary_key(
        &self,
        table: &SyncTable,
        criteria: &[SyncValue],
    ) -> SyncResult<Option<&SyncRow>> {
        Ok(self
            .position_by_primary_key(table, criteria)?
            .map(|i| &self.rows[i]))
    }

    /// Index of the first row whose primary key matches `criteria`.
    pub fn position_by_primary_key(
        &self,
        table: &SyncTable,
        criteria: &[SyncValue],
    ) -> SyncResult<Option<usize>> {
        for (index, row) in self.rows.iter().enumerate() {
            let keys = table.primary_key_values(row);
            if compare_key_values(table, &keys, criteria)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Whether two rows of `table` carry the same primary key.
    pub fn compare_primary_keys(table: &SyncTable, a: &SyncRow, b: &SyncRow) -> SyncResult<bool> {
        compare_key_values(table, &table.primary_key_values(a), &table.primary_key_values(b))
    }
}

/// Compares two primary key tuples after converting both sides to the key
/// columns' declared types.
///
/// A value that cannot be converted does not match.
pub fn compare_key_values(table: &SyncTable, a: &[SyncValue], b: &[SyncValue]) -> SyncResult<bool> {
    if a.len() != b.len() {
        return Err(SyncError::PrimaryKeyCountMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    for ((column, left), right) in table.primary_key_columns().zip(a).zip(b) {
        let target = column.type_code();
        let matched = match (left.convert_to(target), right.convert_to(target)) {
            (Ok(l), Ok(r)) => l == r,
            _ => false,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

impl<'a> IntoIterator for &'a SyncRows {
    type Item = &'a SyncRow;
    type IntoIter = std::slice::Iter<'a, SyncRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for SyncRows {
    type Item = SyncRow;
    type IntoIter = std::vec::IntoIter<SyncRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl FromIterator<SyncRow> for SyncRows {
    fn from_iter<I: IntoIterator<Item = SyncRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl Extend<SyncRow> for SyncRows {
    fn extend<I: IntoIterator<Item = SyncRow>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}
