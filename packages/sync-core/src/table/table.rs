//! Table schema and row ownership.
//!
//! Each table has:
//! - Name and optional schema qualifier
//! - Ordered column collection
//! - Primary key names
//! - Row collection (never serialized with the schema)

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::column::SyncColumn;
use super::columns::SyncColumns;
use super::reader::RecordReader;
use super::row::{RowState, SyncRow};
use super::rows::SyncRows;
use super::validation;
use crate::error::{SyncError, SyncResult};
use crate::schema::NameComparison;
use crate::types::SyncValue;

/// Table schema plus its rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncTable {
    /// Table name
    #[serde(rename = "n")]
    pub table_name: String,
    /// Schema qualifier, empty when the provider has none
    #[serde(rename = "s", default, skip_serializing_if = "String::is_empty")]
    pub schema_name: String,
    /// Provider the table was read from
    #[serde(rename = "op", default, skip_serializing_if = "Option::is_none")]
    pub original_provider: Option<String>,
    /// Columns in ordinal order
    #[serde(rename = "c", default)]
    pub columns: SyncColumns,
    /// Primary key column names
    #[serde(rename = "pk", default, skip_serializing_if = "Vec::is_empty")]
    pub primary_keys: Vec<String>,
    /// Rows; rebuilt from batch files, never part of the schema document
    #[serde(skip)]
    pub rows: SyncRows,
    #[serde(skip)]
    comparison: NameComparison,
}

impl SyncTable {
    /// Creates an empty table.
    ///
    /// # Arguments
    /// * `table_name` - Table name
    /// * `schema_name` - Schema qualifier, may be empty
    pub fn new(table_name: impl Into<String>, schema_name: impl Into<String>) -> Self {
        Self::with_comparison(table_name, schema_name, NameComparison::default())
    }

    /// Creates an empty table with an explicit name comparison rule.
    pub fn with_comparison(
        table_name: impl Into<String>,
        schema_name: impl Into<String>,
        comparison: NameComparison,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            schema_name: schema_name.into(),
            original_provider: None,
            columns: SyncColumns::new(comparison),
            primary_keys: Vec::new(),
            rows: SyncRows::new(),
            comparison,
        }
    }

    /// `schema.name`, or `name` when the table has no schema.
    pub fn full_name(&self) -> String {
        if self.schema_name.is_empty() {
            self.table_name.clone()
        } else {
            format!("{}.{}", self.schema_name, self.table_name)
        }
    }

    /// Name comparison rule used for column and key names.
    pub fn comparison(&self) -> NameComparison {
        self.comparison
    }

    /// Changes the name comparison rule of the table and its columns.
    pub fn set_comparison(&mut self, comparison: NameComparison) {
        self.comparison = comparison;
        self.columns.set_comparison(comparison);
    }

    /// Whether `table_name`/`schema_name` identify this table.
    pub fn is_named(&self, table_name: &str, schema_name: &str) -> bool {
        self.comparison.equals(&self.table_name, table_name)
            && self.comparison.equals(&self.schema_name, schema_name)
    }

    /// Adds a column at the end of the collection.
    pub fn add_column(&mut self, column: SyncColumn) -> SyncResult<usize> {
        self.columns.add(column)
    }

    /// Adds a primary key name, which must match an existing column.
    pub fn add_primary_key(&mut self, name: impl Into<String>) -> SyncResult<()> {
        let name = name.into();
        if !self.columns.contains(&name) {
            return Err(SyncError::PrimaryKeyNotFound {
                table: self.full_name(),
                key: name,
            });
        }
        if !self.is_primary_key(&name) {
            self.primary_keys.push(name);
        }
        Ok(())
    }

    /// Whether `name` is one of the primary keys.
    pub fn is_primary_key(&self, name: &str) -> bool {
        self.comparison.contains(&self.primary_keys, name)
    }

    pub fn has_primary_keys(&self) -> bool {
        !self.primary_keys.is_empty()
    }

    /// Primary key columns ordered by ordinal.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &SyncColumn> + '_ {
        self.columns
            .iter()
            .filter(move |c| self.is_primary_key(&c.column_name))
    }

    /// Columns that take part in inserts and updates, ordered by ordinal.
    ///
    /// Computed and read-only columns are always excluded.
    ///
    /// # Arguments
    /// * `include_auto_increment` - Keep auto-increment columns
    /// * `include_primary_keys` - Keep primary key columns
    pub fn get_mutable_columns(
        &self,
        include_auto_increment: bool,
        include_primary_keys: bool,
    ) -> impl Iterator<Item = &SyncColumn> + '_ {
        self.columns.iter().filter(move |c| {
            c.is_mutable()
                && (include_auto_increment || !c.is_auto_increment)
                && (include_primary_keys || !self.is_primary_key(&c.column_name))
        })
    }

    /// Key values of `row` in [`SyncTable::primary_key_columns`] order.
    pub fn primary_key_values(&self, row: &SyncRow) -> Vec<SyncValue> {
        self.primary_key_columns()
            .map(|c| row.get(c.ordinal()).clone())
            .collect()
    }

    /// Finds a row by primary key values.
    pub fn find_by_primary_key(&self, criteria: &[SyncValue]) -> SyncResult<Option<&SyncRow>> {
        self.rows.find_by_primary_key(self, criteria)
    }

    /// Creates a detached row with one null slot per column.
    pub fn new_row(&self, state: RowState) -> SyncRow {
        SyncRow::new(self.columns.len(), state)
    }

    /// Appends a row after checking its width.
    pub fn add_row(&mut self, row: SyncRow) -> SyncResult<()> {
        validation::validate_row_width(&self.full_name(), &self.columns, &row)?;
        self.rows.push(row);
        Ok(())
    }

    /// Rebuilds a row of this table from a wire tuple.
    ///
    /// # Returns
    /// `ColumnCountMismatch` when the tuple does not carry one value per column.
    pub fn row_from_array(&self, values: Vec<SyncValue>) -> SyncResult<SyncRow> {
        let row = SyncRow::from_array(values)?;
        validation::validate_row_width(&self.full_name(), &self.columns, &row)?;
        Ok(row)
    }

    /// Appends one row per source record.
    ///
    /// When the table has no columns yet they are inferred from the reader's
    /// field names and types. Values are converted to the column types.
    ///
    /// # Returns
    /// Number of rows loaded.
    pub fn load(&mut self, reader: &mut dyn RecordReader) -> SyncResult<usize> {
        if self.columns.is_empty() {
            for index in 0..reader.field_count() {
                let column = SyncColumn::new(reader.field_name(index), reader.field_type(index));
                self.columns.add(column)?;
            }
        }

        let mut mapping = Vec::with_capacity(reader.field_count());
        for index in 0..reader.field_count() {
            let name = reader.field_name(index);
            let ordinal = self
                .columns
                .index_of(name)
                .ok_or_else(|| SyncError::ColumnNotFound {
                    table: self.full_name(),
                    column: name.to_string(),
                })?;
            mapping.push(ordinal);
        }

        let mut loaded = 0;
        while reader.read()? {
            let mut row = self.new_row(RowState::Unchanged);
            for (index, &ordinal) in mapping.iter().enumerate() {
                let target = self.columns[ordinal].type_code();
                row.set(ordinal, reader.value(index)?.convert_to(target)?);
            }
            self.rows.push(row);
            loaded += 1;
        }

        debug!("Loaded {} rows into table '{}'", loaded, self.full_name());
        Ok(loaded)
    }

    /// Copies the schema of this table without its rows.
    pub fn clone_schema(&self) -> SyncTable {
        SyncTable {
            table_name: self.table_name.clone(),
            schema_name: self.schema_name.clone(),
            original_provider: self.original_provider.clone(),
            columns: self.columns.clone(),
            primary_keys: self.primary_keys.clone(),
            rows: SyncRows::new(),
            comparison: self.comparison,
        }
    }

    /// Drops rows, columns and primary keys.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns.clear();
        self.primary_keys.clear();
    }

    /// Checks ordinals and primary key names.
    pub fn validate(&self) -> SyncResult<()> {
        let name = self.full_name();
        validation::validate_ordinals(&name, &self.columns)?;
        validation::validate_primary_keys(&name, &self.columns, &self.primary_keys)
    }

    /// Restores derived state after deserialization and validates the schema.
    pub(crate) fn ensure(&mut self, comparison: NameComparison) -> SyncResult<()> {
        self.set_comparison(comparison);
        self.columns.reassign_ordinals();
        self.validate()
    }

    /// Structural equality of names, columns and primary keys. Rows are ignored.
    pub fn equals_by_properties(&self, other: &SyncTable, comparison: NameComparison) -> bool {
        comparison.equals(&self.table_name, &other.table_name)
            && comparison.equals(&self.schema_name, &other.schema_name)
            && comparison.equals_opt(
                self.original_provider.as_deref(),
                other.original_provider.as_deref(),
            )
            && self.columns.equals_by_properties(&other.columns, comparison)
            && self.primary_keys.len() == other.primary_keys.len()
            && self
                .primary_keys
                .iter()
                .zip(other.primary_keys.iter())
                .all(|(a, b)| comparison.equals(a, b))
    }
}

impl fmt::Display for SyncTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}
