//! Column descriptor within a sync table.

use serde::{Deserialize, Serialize};

use crate::schema::NameComparison;
use crate::types::{DbType, SyncValue, TypeCode};

fn default_true() -> bool {
    true
}

fn default_one() -> i64 {
    1
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_one(value: &i64) -> bool {
    *value == 1
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

fn is_zero_u8(value: &u8) -> bool {
    *value == 0
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

/// Column definition within a table.
///
/// Serialized with compact field names; the declared type travels as its
/// short code under `dt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncColumn {
    /// Column name
    #[serde(rename = "n")]
    pub column_name: String,
    /// Type code (`"1"`..`"20"`, `"-1"`) or an opaque type name
    #[serde(rename = "dt")]
    data_type: String,
    /// Whether the column accepts null
    #[serde(rename = "an", default = "default_true", skip_serializing_if = "is_true")]
    pub allow_db_null: bool,
    #[serde(rename = "iu", default, skip_serializing_if = "is_false")]
    pub is_unique: bool,
    #[serde(rename = "ir", default, skip_serializing_if = "is_false")]
    pub is_read_only: bool,
    #[serde(rename = "ia", default, skip_serializing_if = "is_false")]
    pub is_auto_increment: bool,
    #[serde(rename = "seed", default, skip_serializing_if = "is_zero_i64")]
    pub auto_increment_seed: i64,
    #[serde(rename = "step", default = "default_one", skip_serializing_if = "is_one")]
    pub auto_increment_step: i64,
    #[serde(rename = "ius", default, skip_serializing_if = "is_false")]
    pub is_unsigned: bool,
    #[serde(rename = "iuc", default, skip_serializing_if = "is_false")]
    pub is_unicode: bool,
    /// Computed columns never take part in inserts or updates
    #[serde(rename = "ico", default, skip_serializing_if = "is_false")]
    pub is_compute: bool,
    /// Maximum length, 0 when unspecified
    #[serde(rename = "ml", default, skip_serializing_if = "is_zero_i32")]
    pub max_length: i32,
    /// Position within the owning collection
    #[serde(rename = "o", default)]
    pub(crate) ordinal: usize,
    #[serde(rename = "ps", default, skip_serializing_if = "is_false")]
    pub precision_is_specified: bool,
    #[serde(rename = "p", default, skip_serializing_if = "is_zero_u8")]
    pub precision: u8,
    #[serde(rename = "ss", default, skip_serializing_if = "is_false")]
    pub scale_is_specified: bool,
    #[serde(rename = "s", default, skip_serializing_if = "is_zero_u8")]
    pub scale: u8,
    /// Provider-specific type enum value, as text
    #[serde(rename = "odb", default, skip_serializing_if = "Option::is_none")]
    pub original_db_type: Option<String>,
    /// Provider-specific type name, e.g. `nvarchar` or `datetime2`
    #[serde(rename = "oty", default, skip_serializing_if = "Option::is_none")]
    pub original_type_name: Option<String>,
    /// Normalized database type derived from `data_type`
    #[serde(rename = "db", default, skip_serializing_if = "Option::is_none")]
    db_type: Option<DbType>,
    /// Default value expression as declared by the provider
    #[serde(rename = "dv", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl SyncColumn {
    /// Creates a new nullable column of the given type.
    pub fn new(name: impl Into<String>, type_code: TypeCode) -> Self {
        let mut column = Self::untyped(name.into());
        column.set_type(type_code);
        column
    }

    /// Creates a column from a type code or type name string.
    ///
    /// Unrecognized names are kept verbatim and treated as [`TypeCode::Object`].
    pub fn with_type_name(name: impl Into<String>, type_name: &str) -> Self {
        let mut column = Self::untyped(name.into());
        column.set_type_name(type_name);
        column
    }

    fn untyped(column_name: String) -> Self {
        Self {
            column_name,
            data_type: TypeCode::Object.code().to_string(),
            allow_db_null: true,
            is_unique: false,
            is_read_only: false,
            is_auto_increment: false,
            auto_increment_seed: 0,
            auto_increment_step: 1,
            is_unsigned: false,
            is_unicode: false,
            is_compute: false,
            max_length: 0,
            ordinal: 0,
            precision_is_specified: false,
            precision: 0,
            scale_is_specified: false,
            scale: 0,
            original_db_type: None,
            original_type_name: None,
            db_type: None,
            default_value: None,
        }
    }

    /// Sets the declared type and recomputes the database type.
    pub fn set_type(&mut self, type_code: TypeCode) {
        self.data_type = type_code.code().to_string();
        self.db_type = Some(DbType::coerce(type_code, self.is_datetime2()));
    }

    /// Sets the declared type from a code or a type name.
    ///
    /// A string that is neither a known code nor a known type name is stored
    /// as-is and the database type becomes [`DbType::Object`].
    pub fn set_type_name(&mut self, type_name: &str) {
        match TypeCode::from_code_or_name(type_name) {
            Some(code) => self.set_type(code),
            None => {
                self.data_type = type_name.to_string();
                self.db_type = Some(DbType::Object);
            }
        }
    }

    /// Returns the raw `dt` value: a short code or an opaque type name.
    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    /// Resolves the declared type; opaque names resolve to [`TypeCode::Object`].
    pub fn type_code(&self) -> TypeCode {
        TypeCode::from_code_or_name(&self.data_type).unwrap_or(TypeCode::Object)
    }

    /// Returns the normalized database type, deriving it when not yet computed.
    pub fn db_type(&self) -> DbType {
        self.db_type
            .unwrap_or_else(|| DbType::coerce(self.type_code(), self.is_datetime2()))
    }

    /// Zero-initialized value for value-type columns, `Null` otherwise.
    pub fn default_value_for_type(&self) -> SyncValue {
        SyncValue::default_for(self.type_code())
    }

    /// Zero-based position of this column within its table.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Whether values of this column are excluded from inserts/updates.
    pub fn is_mutable(&self) -> bool {
        !self.is_compute && !self.is_read_only
    }

    fn is_datetime2(&self) -> bool {
        self.original_type_name
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("datetime2"))
    }

    /// Compares every attribute except the ordinal.
    ///
    /// Names and type names follow `comparison`.
    pub fn equals_by_properties(&self, other: &SyncColumn, comparison: NameComparison) -> bool {
        comparison.equals(&self.column_name, &other.column_name)
            && comparison.equals(&self.data_type, &other.data_type)
            && self.allow_db_null == other.allow_db_null
            && self.is_unique == other.is_unique
            && self.is_read_only == other.is_read_only
            && self.is_auto_increment == other.is_auto_increment
            && self.auto_increment_seed == other.auto_increment_seed
            && self.auto_increment_step == other.auto_increment_step
            && self.is_unsigned == other.is_unsigned
            && self.is_unicode == other.is_unicode
            && self.is_compute == other.is_compute
            && self.max_length == other.max_length
            && self.precision_is_specified == other.precision_is_specified
            && self.precision == other.precision
            && self.scale_is_specified == other.scale_is_specified
            && self.scale == other.scale
            && comparison.equals_opt(
                self.original_db_type.as_deref(),
                other.original_db_type.as_deref(),
            )
            && comparison.equals_opt(
                self.original_type_name.as_deref(),
                other.original_type_name.as_deref(),
            )
            && self.db_type() == other.db_type()
            && self.default_value == other.default_value
    }
}
