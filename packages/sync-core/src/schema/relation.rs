//! Parent/child relations between tables of a schema set.

use serde::{Deserialize, Serialize};

use super::comparison::NameComparison;

/// Reference to one column of one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncColumnIdentifier {
    #[serde(rename = "c")]
    pub column_name: String,
    #[serde(rename = "t")]
    pub table_name: String,
    #[serde(rename = "s", default, skip_serializing_if = "String::is_empty")]
    pub schema_name: String,
}

impl SyncColumnIdentifier {
    pub fn new(
        column_name: impl Into<String>,
        table_name: impl Into<String>,
        schema_name: impl Into<String>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            table_name: table_name.into(),
            schema_name: schema_name.into(),
        }
    }

    /// Whether this identifier points into the given table.
    pub fn is_in_table(&self, table_name: &str, schema_name: &str, comparison: NameComparison) -> bool {
        comparison.equals(&self.table_name, table_name)
            && comparison.equals(&self.schema_name, schema_name)
    }

    pub fn equals_by_properties(&self, other: &Self, comparison: NameComparison) -> bool {
        comparison.equals(&self.column_name, &other.column_name)
            && self.is_in_table(&other.table_name, &other.schema_name, comparison)
    }
}

/// Foreign key relation: child columns referencing parent columns, pairwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncRelation {
    /// Relation name
    #[serde(rename = "n")]
    pub relation_name: String,
    /// Columns of the referencing (child) table
    #[serde(rename = "cks")]
    pub keys: Vec<SyncColumnIdentifier>,
    /// Referenced columns of the parent table
    #[serde(rename = "pks")]
    pub parent_keys: Vec<SyncColumnIdentifier>,
}

impl SyncRelation {
    pub fn new(
        relation_name: impl Into<String>,
        keys: Vec<SyncColumnIdentifier>,
        parent_keys: Vec<SyncColumnIdentifier>,
    ) -> Self {
        Self {
            relation_name: relation_name.into(),
            keys,
            parent_keys,
        }
    }

    /// Whether the named table is the child side of this relation.
    pub fn is_child(&self, table_name: &str, schema_name: &str, comparison: NameComparison) -> bool {
        self.keys
            .first()
            .is_some_and(|k| k.is_in_table(table_name, schema_name, comparison))
    }

    /// Whether the named table is the parent side of this relation.
    pub fn is_parent(&self, table_name: &str, schema_name: &str, comparison: NameComparison) -> bool {
        self.parent_keys
            .first()
            .is_some_and(|k| k.is_in_table(table_name, schema_name, comparison))
    }

    pub fn equals_by_properties(&self, other: &Self, comparison: NameComparison) -> bool {
        comparison.equals(&self.relation_name, &other.relation_name)
            && identifiers_equal(&self.keys, &other.keys, comparison)
            && identifiers_equal(&self.parent_keys, &other.parent_keys, comparison)
    }
}

fn identifiers_equal(
    a: &[SyncColumnIdentifier],
    b: &[SyncColumnIdentifier],
    comparison: NameComparison,
) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|(x, y)| x.equals_by_properties(y, comparison))
}
