//! Schema set: the root of the table/relation/filter model.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::comparison::NameComparison;
use super::filter::SyncFilter;
use super::relation::{SyncColumnIdentifier, SyncRelation};
use crate::error::{SyncError, SyncResult};
use crate::table::SyncTable;

/// Tables, relations and filters of one sync scope.
///
/// The set exclusively owns its children. Children refer to each other by
/// name only, so a deserialized set needs no re-linking; [`SyncSet::ensure_schema`]
/// restores derived state and validates the cross references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSet {
    #[serde(rename = "t", default)]
    pub tables: Vec<SyncTable>,
    #[serde(rename = "r", default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<SyncRelation>,
    #[serde(rename = "f", default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<SyncFilter>,
    #[serde(skip)]
    comparison: NameComparison,
}

impl SyncSet {
    /// Creates an empty set using the default name comparison.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set with an explicit name comparison rule.
    pub fn with_comparison(comparison: NameComparison) -> Self {
        Self {
            comparison,
            ..Default::default()
        }
    }

    pub fn comparison(&self) -> NameComparison {
        self.comparison
    }

    /// Changes the name comparison rule of the set and every table.
    pub fn set_comparison(&mut self, comparison: NameComparison) {
        self.comparison = comparison;
        for table in &mut self.tables {
            table.set_comparison(comparison);
        }
    }

    /// Adds a table, adopting the set's name comparison rule.
    ///
    /// # Returns
    /// `DuplicateTable` when a table with the same name and schema exists.
    pub fn add_table(&mut self, mut table: SyncTable) -> SyncResult<&mut SyncTable> {
        if self.position(&table.table_name, &table.schema_name).is_some() {
            return Err(SyncError::DuplicateTable {
                table: table.full_name(),
            });
        }
        table.set_comparison(self.comparison);
        self.tables.push(table);
        let last = self.tables.len() - 1;
        Ok(&mut self.tables[last])
    }

    fn position(&self, table_name: &str, schema_name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.is_named(table_name, schema_name))
    }

    /// Looks up a table by name and schema.
    pub fn table(&self, table_name: &str, schema_name: &str) -> Option<&SyncTable> {
        self.position(table_name, schema_name).map(|i| &self.tables[i])
    }

    /// Looks up a table by name and schema for modification.
    pub fn table_mut(&mut self, table_name: &str, schema_name: &str) -> Option<&mut SyncTable> {
        self.position(table_name, schema_name)
            .map(move |i| &mut self.tables[i])
    }

    /// Removes a table by name and schema.
    pub fn remove_table(&mut self, table_name: &str, schema_name: &str) -> Option<SyncTable> {
        self.position(table_name, schema_name)
            .map(|i| self.tables.remove(i))
    }

    pub fn has_tables(&self) -> bool {
        !self.tables.is_empty()
    }

    /// Whether at least one table has columns.
    pub fn has_columns(&self) -> bool {
        self.tables.iter().any(|t| !t.columns.is_empty())
    }

    /// Relations where the given table holds the foreign key.
    pub fn relations_for_child<'a>(
        &'a self,
        table: &'a SyncTable,
    ) -> impl Iterator<Item = &'a SyncRelation> + 'a {
        self.relations.iter().filter(move |r| {
            r.is_child(&table.table_name, &table.schema_name, self.comparison)
        })
    }

    /// Relations where the given table is referenced.
    pub fn relations_for_parent<'a>(
        &'a self,
        table: &'a SyncTable,
    ) -> impl Iterator<Item = &'a SyncRelation> + 'a {
        self.relations.iter().filter(move |r| {
            r.is_parent(&table.table_name, &table.schema_name, self.comparison)
        })
    }

    /// Copies filters, relations and, when `include_tables` is set, the
    /// schema of every table. Rows are never copied.
    pub fn clone_schema(&self, include_tables: bool) -> SyncSet {
        let tables = if include_tables {
            self.tables.iter().map(SyncTable::clone_schema).collect()
        } else {
            Vec::new()
        };
        SyncSet {
            tables,
            relations: self.relations.clone(),
            filters: self.filters.clone(),
            comparison: self.comparison,
        }
    }

    /// Restores derived state after deserialization and checks cross references.
    ///
    /// Column ordinals are reassigned, every table adopts the set's name
    /// comparison, and primary keys, relation columns and filter tables are
    /// checked against the owned tables.
    pub fn ensure_schema(&mut self) -> SyncResult<()> {
        let comparison = self.comparison;
        for index in 0..self.tables.len() {
            self.tables[index].ensure(comparison)?;
            let (name, schema) = (
                &self.tables[index].table_name,
                &self.tables[index].schema_name,
            );
            if self.position(name, schema) != Some(index) {
                return Err(SyncError::DuplicateTable {
                    table: self.tables[index].full_name(),
                });
            }
        }

        for relation in &self.relations {
            for identifier in relation.keys.iter().chain(relation.parent_keys.iter()) {
                self.resolve(identifier)?;
            }
        }

        for filter in &self.filters {
            if self.table(&filter.table_name, &filter.schema_name).is_none() {
                return Err(SyncError::TableNotFound {
                    table: filter.table_name.clone(),
                });
            }
        }

        debug!(
            "Schema ensured: {} tables, {} relations, {} filters",
            self.tables.len(),
            self.relations.len(),
            self.filters.len()
        );
        Ok(())
    }

    fn resolve(&self, identifier: &SyncColumnIdentifier) -> SyncResult<()> {
        let table = self
            .table(&identifier.table_name, &identifier.schema_name)
            .ok_or_else(|| SyncError::TableNotFound {
                table: identifier.table_name.clone(),
            })?;
        if !table.columns.contains(&identifier.column_name) {
            return Err(SyncError::ColumnNotFound {
                table: table.full_name(),
                column: identifier.column_name.clone(),
            });
        }
        Ok(())
    }

    /// Deep structural equality of tables, relations and filters.
    pub fn equals_by_properties(&self, other: &SyncSet, comparison: NameComparison) -> bool {
        self.tables.len() == other.tables.len()
            && self
                .tables
                .iter()
                .zip(other.tables.iter())
                .all(|(a, b)| a.equals_by_properties(b, comparison))
            && self.relations.len() == other.relations.len()
            && self
                .relations
                .iter()
                .zip(other.relations.iter())
                .all(|(a, b)| a.equals_by_properties(b, comparison))
            && self.filters.len() == other.filters.len()
            && self
                .filters
                .iter()
                .zip(other.filters.iter())
                .all(|(a, b)| a.equals_by_properties(b, comparison))
    }

    /// Drops every table, relation and filter.
    pub fn clear(&mut self) {
        for table in &mut self.tables {
            table.clear();
        }
        self.tables.clear();
        self.relations.clear();
        self.filters.clear();
    }

    /// Serializes the schema (without rows) to compact JSON.
    pub fn to_json(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a schema document and ensures it.
    pub fn from_json(json: &str, comparison: NameComparison) -> SyncResult<SyncSet> {
        let mut set: SyncSet = serde_json::from_str(json)?;
        set.comparison = comparison;
        set.ensure_schema()?;
        Ok(set)
    }
}
