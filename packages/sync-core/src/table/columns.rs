//! Ordered column collection.

use std::ops::Index;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::column::SyncColumn;
use crate::error::{SyncError, SyncResult};
use crate::schema::NameComparison;

/// Ordered collection of columns.
///
/// Every column's ordinal equals its index. Ordinals are reassigned after
/// each structural change.
#[derive(Debug, Clone, Default)]
pub struct SyncColumns {
    columns: Vec<SyncColumn>,
    comparison: NameComparison,
}

impl SyncColumns {
    /// Creates an empty collection using the given name comparison.
    pub fn new(comparison: NameComparison) -> Self {
        Self {
            columns: Vec::new(),
            comparison,
        }
    }

    /// Returns the name comparison rule used for lookups.
    pub fn comparison(&self) -> NameComparison {
        self.comparison
    }

    pub(crate) fn set_comparison(&mut self, comparison: NameComparison) {
        self.comparison = comparison;
    }

    /// Appends a column.
    ///
    /// # Returns
    /// The ordinal assigned to the column, or `DuplicateColumn`.
    pub fn add(&mut self, column: SyncColumn) -> SyncResult<usize> {
        let position = self.columns.len();
        self.insert(position, column)?;
        Ok(position)
    }

    /// Inserts a column at `position` (clamped to the end of the collection).
    pub fn insert(&mut self, position: usize, column: SyncColumn) -> SyncResult<()> {
        if self.contains(&column.column_name) {
            return Err(SyncError::DuplicateColumn {
                column: column.column_name,
            });
        }
        let position = position.min(self.columns.len());
        self.columns.insert(position, column);
        self.reassign_ordinals();
        Ok(())
    }

    /// Removes a column by name.
    pub fn remove(&mut self, name: &str) -> Option<SyncColumn> {
        let index = self.index_of(name)?;
        let column = self.columns.remove(index);
        self.reassign_ordinals();
        Some(column)
    }

    /// Moves a column to a new position.
    ///
    /// Fails with `OrdinalOutOfRange` when `position` is past the last column
    /// and with `ColumnNotFound` when no column has that name.
    pub fn reorder(&mut self, name: &str, position: usize) -> SyncResult<()> {
        if position >= self.columns.len() {
            return Err(SyncError::OrdinalOutOfRange {
                column: name.to_string(),
                position,
                len: self.columns.len(),
            });
        }
        let index = self.index_of(name).ok_or_else(|| SyncError::ColumnNotFound {
            table: String::new(),
            column: name.to_string(),
        })?;
        let column = self.columns.remove(index);
        self.columns.insert(position, column);
        self.reassign_ordinals();
        Ok(())
    }

    /// Removes all columns.
    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// Returns the position of the named column.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| self.comparison.equals(&c.column_name, name))
    }

    /// Returns true if a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Looks up a column by name.
    pub fn get(&self, name: &str) -> Option<&SyncColumn> {
        self.index_of(name).map(|i| &self.columns[i])
    }

    /// Looks up a column by name for modification.
    ///
    /// Renaming through this reference is not checked for duplicates.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut SyncColumn> {
        self.index_of(name).map(move |i| &mut self.columns[i])
    }

    /// Looks up a column by ordinal.
    pub fn by_ordinal(&self, ordinal: usize) -> Option<&SyncColumn> {
        self.columns.get(ordinal)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates columns in ordinal order.
    pub fn iter(&self) -> std::slice::Iter<'_, SyncColumn> {
        self.columns.iter()
    }

    /// Column names in ordinal order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.column_name.as_str())
    }

    pub(crate) fn reassign_ordinals(&mut self) {
        for (ordinal, column) in self.columns.iter_mut().enumerate() {
            column.ordinal = ordinal;
        }
    }

    /// Element-wise structural equality.
    pub fn equals_by_properties(&self, other: &SyncColumns, comparison: NameComparison) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(a, b)| a.equals_by_properties(b, comparison))
    }
}

impl Index<usize> for SyncColumns {
    type Output = SyncColumn;

    fn index(&self, ordinal: usize) -> &SyncColumn {
        &self.columns[ordinal]
    }
}

impl<'a> IntoIterator for &'a SyncColumns {
    type Item = &'a SyncColumn;
    type IntoIter = std::slice::Iter<'a, SyncColumn>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl Serialize for SyncColumns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.columns.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SyncColumns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let columns = Vec::<SyncColumn>::deserialize(deserializer)?;
        let mut collection = SyncColumns {
            columns,
            comparison: NameComparison::default(),
        };
        collection.reassign_ordinals();
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeCode;
    use ntest::timeout;

    fn ordinals_match(columns: &SyncColumns) -> bool {
        columns.iter().enumerate().all(|(i, c)| c.ordinal() == i)
    }

    fn sample() -> SyncColumns {
        let mut columns = SyncColumns::new(NameComparison::OrdinalIgnoreCase);
        columns.add(SyncColumn::new("Id", TypeCode::Int32)).unwrap();
        columns.add(SyncColumn::new("Name", TypeCode::String)).unwrap();
        columns.add(SyncColumn::new("Email", TypeCode::String)).unwrap();
        columns
    }

    #[timeout(1000)]
    #[test]
    fn test_ordinals_follow_mutations() {
        let mut columns = sample();
        assert!(ordinals_match(&columns));

        columns.insert(0, SyncColumn::new("RowGuid", TypeCode::Guid)).unwrap();
        assert!(ordinals_match(&columns));
        assert_eq!(columns.index_of("id"), Some(1));

        columns.remove("Name").unwrap();
        assert!(ordinals_match(&columns));
        assert_eq!(columns.names().collect::<Vec<_>>(), vec!["RowGuid", "Id", "Email"]);

        columns.reorder("Email", 0).unwrap();
        assert!(ordinals_match(&columns));
        assert_eq!(columns[0].column_name, "Email");
    }

    #[timeout(1000)]
    #[test]
    fn test_reorder_out_of_range() {
        let mut columns = sample();
        let err = columns.reorder("Id", 3).unwrap_err();
        assert!(matches!(err, SyncError::OrdinalOutOfRange { position: 3, len: 3, .. }));
        assert_eq!(columns.index_of("Id"), Some(0));
    }

    #[timeout(1000)]
    #[test]
    fn test_duplicate_rejected() {
        let mut columns = sample();
        let err = columns.add(SyncColumn::new("NAME", TypeCode::String)).unwrap_err();
        assert!(matches!(err, SyncError::DuplicateColumn { .. }));
        assert_eq!(columns.len(), 3);
    }

    #[timeout(1000)]
    #[test]
    fn test_missing_lookup_is_none() {
        let columns = sample();
        assert!(columns.get("Missing").is_none());
        assert!(columns.index_of("Missing").is_none());
        assert!(columns.by_ordinal(10).is_none());
    }

    #[timeout(1000)]
    #[test]
    fn test_deserialize_reassigns_ordinals() {
        let json = r#"[{"n":"A","dt":"6","o":5},{"n":"B","dt":"17","o":9}]"#;
        let columns: SyncColumns = serde_json::from_str(json).unwrap();
        assert!(ordinals_match(&columns));
    }
}
