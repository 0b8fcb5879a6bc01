//! Positional row buffer and row state.

use std::fmt;
use std::ops::{Index, IndexMut};

use super::column::SyncColumn;
use super::table::SyncTable;
use crate::error::{SyncError, SyncResult};
use crate::types::{SyncValue, TypeCode};

/// Number of slots added each time a row buffer grows.
pub const ROW_GROWTH: usize = 16;

/// Smallest backing buffer allocated for a row.
pub const MIN_CAPACITY: usize = 32;

static NULL: SyncValue = SyncValue::Null;

/// Change state of a row, written as a number in slot 0 of the wire tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum RowState {
    #[default]
    Unchanged = 0,
    Added = 1,
    Modified = 2,
    Deleted = 3,
}

impl RowState {
    /// Numeric wire code.
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl TryFrom<i64> for RowState {
    type Error = SyncError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(RowState::Unchanged),
            1 => Ok(RowState::Added),
            2 => Ok(RowState::Modified),
            3 => Ok(RowState::Deleted),
            other => Err(SyncError::InvalidRowState(other)),
        }
    }
}

impl TryFrom<&SyncValue> for RowState {
    type Error = SyncError;

    fn try_from(value: &SyncValue) -> Result<Self, Self::Error> {
        let code = value
            .convert_to(TypeCode::Int64)?
            .as_i64()
            .ok_or_else(|| SyncError::conversion(value, "RowState"))?;
        RowState::try_from(code)
    }
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowState::Unchanged => "Unchanged",
            RowState::Added => "Added",
            RowState::Modified => "Modified",
            RowState::Deleted => "Deleted",
        };
        f.write_str(name)
    }
}

/// One table row: a positional value buffer indexed by column ordinal.
///
/// The logical length is the number of column slots. The backing buffer
/// grows in steps of [`ROW_GROWTH`] and never shrinks. The row does not hold
/// its table; name lookups take the owning [`SyncTable`] explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRow {
    buffer: Vec<SyncValue>,
    length: usize,
    state: RowState,
}

impl SyncRow {
    /// Creates a row with `length` null slots.
    pub fn new(length: usize, state: RowState) -> Self {
        let mut buffer = Vec::new();
        buffer.resize(grown_capacity(length), SyncValue::Null);
        Self {
            buffer,
            length,
            state,
        }
    }

    /// Rebuilds a row from a wire tuple `[state, col0, col1, ...]`.
    ///
    /// # Returns
    /// `TypeConversion` for an empty tuple, `InvalidRowState` for an unknown
    /// state code.
    pub fn from_array(values: Vec<SyncValue>) -> SyncResult<Self> {
        let mut values = values.into_iter();
        let state = match values.next() {
            Some(first) => RowState::try_from(&first)?,
            None => return Err(SyncError::conversion("[]", "RowState")),
        };
        let values: Vec<SyncValue> = values.collect();
        let mut row = SyncRow::new(values.len(), state);
        for (slot, value) in row.buffer.iter_mut().zip(values) {
            *slot = value;
        }
        Ok(row)
    }

    /// Current row state.
    pub fn state(&self) -> RowState {
        self.state
    }

    pub fn set_state(&mut self, state: RowState) {
        self.state = state;
    }

    /// Number of column slots.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Allocated slot count.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Column values in ordinal order.
    pub fn values(&self) -> &[SyncValue] {
        &self.buffer[..self.length]
    }

    /// Value at `ordinal`, or `Null` past the end of the row.
    pub fn get(&self, ordinal: usize) -> &SyncValue {
        if ordinal < self.length {
            &self.buffer[ordinal]
        } else {
            &NULL
        }
    }

    /// Writes a value, extending the row when `ordinal` is past its end.
    pub fn set(&mut self, ordinal: usize, value: impl Into<SyncValue>) {
        *self.slot_mut(ordinal) = value.into();
    }

    fn slot_mut(&mut self, ordinal: usize) -> &mut SyncValue {
        if ordinal >= self.length {
            self.length = ordinal + 1;
            if self.length > self.buffer.len() {
                self.buffer
                    .resize(grown_capacity(self.length), SyncValue::Null);
            }
        }
        &mut self.buffer[ordinal]
    }

    /// Value of the given column.
    pub fn get_column(&self, column: &SyncColumn) -> &SyncValue {
        self.get(column.ordinal())
    }

    /// Value of the named column of `table`.
    pub fn get_by_name(&self, table: &SyncTable, name: &str) -> SyncResult<&SyncValue> {
        Ok(self.get(ordinal_of(table, name)?))
    }

    /// Writes the named column of `table`.
    pub fn set_by_name(
        &mut self,
        table: &SyncTable,
        name: &str,
        value: impl Into<SyncValue>,
    ) -> SyncResult<()> {
        let ordinal = ordinal_of(table, name)?;
        self.set(ordinal, value);
        Ok(())
    }

    /// Wire tuple: the state code followed by every column value.
    pub fn to_array(&self) -> Vec<SyncValue> {
        let mut array = Vec::with_capacity(self.length + 1);
        array.push(SyncValue::Int32(self.state.code()));
        array.extend_from_slice(self.values());
        array
    }

    /// Sets every slot to `Null`, keeping the allocation.
    pub fn clear(&mut self) {
        for slot in self.buffer.iter_mut() {
            *slot = SyncValue::Null;
        }
    }
}

fn grown_capacity(length: usize) -> usize {
    let rounded = length.div_ceil(ROW_GROWTH) * ROW_GROWTH;
    rounded.max(MIN_CAPACITY)
}

fn ordinal_of(table: &SyncTable, name: &str) -> SyncResult<usize> {
    table
        .columns
        .index_of(name)
        .ok_or_else(|| SyncError::ColumnNotFound {
            table: table.full_name(),
            column: name.to_string(),
        })
}

impl Index<usize> for SyncRow {
    type Output = SyncValue;

    fn index(&self, ordinal: usize) -> &SyncValue {
        self.get(ordinal)
    }
}

impl IndexMut<usize> for SyncRow {
    fn index_mut(&mut self, ordinal: usize) -> &mut SyncValue {
        self.slot_mut(ordinal)
    }
}

impl fmt::Display for SyncRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.state)?;
        for (i, value) in self.values().iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::timeout;

    #[timeout(1000)]
    #[test]
    fn test_growth_policy() {
        let mut row = SyncRow::new(3, RowState::Added);
        assert_eq!(row.len(), 3);
        assert_eq!(row.capacity(), MIN_CAPACITY);

        row.set(40, 7i32);
        assert_eq!(row.len(), 41);
        assert_eq!(row.capacity(), 48);
        assert_eq!(row[40], SyncValue::Int32(7));
        assert_eq!(row[39], SyncValue::Null);

        row.clear();
        assert_eq!(row.capacity(), 48);
        assert_eq!(row.len(), 41);
        assert!(row.values().iter().all(SyncValue::is_null));
    }

    #[timeout(1000)]
    #[test]
    fn test_read_past_end_is_null() {
        let row = SyncRow::new(2, RowState::Unchanged);
        assert_eq!(row[100], SyncValue::Null);
        assert_eq!(row.len(), 2);
    }

    #[timeout(1000)]
    #[test]
    fn test_to_array_state_first() {
        let mut row = SyncRow::new(2, RowState::Modified);
        row[0] = SyncValue::Int32(5);
        row[1] = SyncValue::from("Bob");
        assert_eq!(
            row.to_array(),
            vec![SyncValue::Int32(2), SyncValue::Int32(5), SyncValue::from("Bob")]
        );

        let back = SyncRow::from_array(row.to_array()).unwrap();
        assert_eq!(back.state(), RowState::Modified);
        assert_eq!(back.values(), row.values());
    }

    #[timeout(1000)]
    #[test]
    fn test_from_array_rejects_bad_state() {
        let err = SyncRow::from_array(vec![SyncValue::Int64(9)]).unwrap_err();
        assert_eq!(err, SyncError::InvalidRowState(9));
        assert!(SyncRow::from_array(Vec::new()).is_err());
    }

    #[timeout(1000)]
    #[test]
    fn test_row_state_codes() {
        for state in [
            RowState::Unchanged,
            RowState::Added,
            RowState::Modified,
            RowState::Deleted,
        ] {
            assert_eq!(RowState::try_from(i64::from(state.code())).unwrap(), state);
        }
    }
}
