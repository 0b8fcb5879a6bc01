//! Row filter descriptors.
//!
//! Filters are carried with the schema and consumed by the provider layer
//! that generates the filtered change queries; nothing here evaluates them.

use serde::{Deserialize, Serialize};

use super::comparison::NameComparison;
use crate::types::DbType;

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Filter applied to one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncFilter {
    #[serde(rename = "t")]
    pub table_name: String,
    #[serde(rename = "s", default, skip_serializing_if = "String::is_empty")]
    pub schema_name: String,
    #[serde(rename = "p", default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<SyncFilterParameter>,
    #[serde(rename = "j", default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<SyncFilterJoin>,
    #[serde(rename = "w", default, skip_serializing_if = "Vec::is_empty")]
    pub wheres: Vec<SyncFilterWhereSideItem>,
    /// Raw where fragments appended verbatim by the provider
    #[serde(rename = "cw", default, skip_serializing_if = "Vec::is_empty")]
    pub custom_wheres: Vec<String>,
}

impl SyncFilter {
    pub fn new(table_name: impl Into<String>, schema_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema_name: schema_name.into(),
            ..Default::default()
        }
    }

    /// Adds a parameter.
    pub fn add_parameter(&mut self, parameter: SyncFilterParameter) -> &mut Self {
        self.parameters.push(parameter);
        self
    }

    /// Adds a where item binding a column to a parameter.
    pub fn add_where(
        &mut self,
        column_name: impl Into<String>,
        table_name: impl Into<String>,
        parameter_name: impl Into<String>,
    ) -> &mut Self {
        self.wheres.push(SyncFilterWhereSideItem {
            column_name: column_name.into(),
            table_name: table_name.into(),
            schema_name: String::new(),
            parameter_name: parameter_name.into(),
        });
        self
    }

    /// Adds an inner or outer join.
    pub fn add_join(&mut self, join: SyncFilterJoin) -> &mut Self {
        self.joins.push(join);
        self
    }

    /// Adds a raw where fragment.
    pub fn add_custom_where(&mut self, fragment: impl Into<String>) -> &mut Self {
        self.custom_wheres.push(fragment.into());
        self
    }

    pub fn equals_by_properties(&self, other: &Self, comparison: NameComparison) -> bool {
        comparison.equals(&self.table_name, &other.table_name)
            && comparison.equals(&self.schema_name, &other.schema_name)
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(other.parameters.iter())
                .all(|(a, b)| a.equals_by_properties(b, comparison))
            && self.joins.len() == other.joins.len()
            && self
                .joins
                .iter()
                .zip(other.joins.iter())
                .all(|(a, b)| a.equals_by_properties(b, comparison))
            && self.wheres.len() == other.wheres.len()
            && self
                .wheres
                .iter()
                .zip(other.wheres.iter())
                .all(|(a, b)| a.equals_by_properties(b, comparison))
            && self.custom_wheres == other.custom_wheres
    }
}

/// Named parameter of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncFilterParameter {
    #[serde(rename = "n")]
    pub name: String,
    /// Table the parameter type is taken from, when it mirrors a column
    #[serde(rename = "t", default, skip_serializing_if = "String::is_empty")]
    pub table_name: String,
    #[serde(rename = "s", default, skip_serializing_if = "String::is_empty")]
    pub schema_name: String,
    #[serde(rename = "dt", default, skip_serializing_if = "Option::is_none")]
    pub db_type: Option<DbType>,
    #[serde(rename = "dv", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(rename = "an", default = "default_true", skip_serializing_if = "is_true")]
    pub allow_null: bool,
    #[serde(rename = "ml", default)]
    pub max_length: i32,
}

impl SyncFilterParameter {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            schema_name: String::new(),
            db_type: None,
            default_value: None,
            allow_null: true,
            max_length: 0,
        }
    }

    pub fn equals_by_properties(&self, other: &Self, comparison: NameComparison) -> bool {
        comparison.equals(&self.name, &other.name)
            && comparison.equals(&self.table_name, &other.table_name)
            && comparison.equals(&self.schema_name, &other.schema_name)
            && self.db_type == other.db_type
            && self.default_value == other.default_value
            && self.allow_null == other.allow_null
            && self.max_length == other.max_length
    }
}

/// Kind of join used to reach the filtered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Join {
    #[default]
    Inner,
    Left,
    Right,
}

/// Join between two tables of a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncFilterJoin {
    #[serde(rename = "je")]
    pub join: Join,
    #[serde(rename = "tbl")]
    pub table_name: String,
    #[serde(rename = "ltbl")]
    pub left_table_name: String,
    #[serde(rename = "lcol")]
    pub left_column_name: String,
    #[serde(rename = "rtbl")]
    pub right_table_name: String,
    #[serde(rename = "rcol")]
    pub right_column_name: String,
}

impl SyncFilterJoin {
    pub fn equals_by_properties(&self, other: &Self, comparison: NameComparison) -> bool {
        self.join == other.join
            && comparison.equals(&self.table_name, &other.table_name)
            && comparison.equals(&self.left_table_name, &other.left_table_name)
            && comparison.equals(&self.left_column_name, &other.left_column_name)
            && comparison.equals(&self.right_table_name, &other.right_table_name)
            && comparison.equals(&self.right_column_name, &other.right_column_name)
    }
}

/// Where item comparing a column to a filter parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncFilterWhereSideItem {
    #[serde(rename = "c")]
    pub column_name: String,
    #[serde(rename = "t")]
    pub table_name: String,
    #[serde(rename = "s", default, skip_serializing_if = "String::is_empty")]
    pub schema_name: String,
    #[serde(rename = "p")]
    pub parameter_name: String,
}

impl SyncFilterWhereSideItem {
    pub fn equals_by_properties(&self, other: &Self, comparison: NameComparison) -> bool {
        comparison.equals(&self.column_name, &other.column_name)
            && comparison.equals(&self.table_name, &other.table_name)
            && comparison.equals(&self.schema_name, &other.schema_name)
            && comparison.equals(&self.parameter_name, &other.parameter_name)
    }
}
