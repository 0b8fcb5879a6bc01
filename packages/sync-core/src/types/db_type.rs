//! Normalized provider-neutral database types.

use serde::{Deserialize, Serialize};

use super::type_code::TypeCode;

/// Provider-neutral database type derived from a column's [`TypeCode`].
///
/// Serialized as its numeric discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum DbType {
    AnsiString = 0,
    Binary = 1,
    Byte = 2,
    Boolean = 3,
    Currency = 4,
    Date = 5,
    DateTime = 6,
    Decimal = 7,
    Double = 8,
    Guid = 9,
    Int16 = 10,
    Int32 = 11,
    Int64 = 12,
    Object = 13,
    SByte = 14,
    Single = 15,
    String = 16,
    Time = 17,
    UInt16 = 18,
    UInt32 = 19,
    UInt64 = 20,
    VarNumeric = 21,
    AnsiStringFixedLength = 22,
    StringFixedLength = 23,
    Xml = 25,
    DateTime2 = 26,
    DateTimeOffset = 27,
}

impl DbType {
    const ALL: [DbType; 27] = [
        DbType::AnsiString,
        DbType::Binary,
        DbType::Byte,
        DbType::Boolean,
        DbType::Currency,
        DbType::Date,
        DbType::DateTime,
        DbType::Decimal,
        DbType::Double,
        DbType::Guid,
        DbType::Int16,
        DbType::Int32,
        DbType::Int64,
        DbType::Object,
        DbType::SByte,
        DbType::Single,
        DbType::String,
        DbType::Time,
        DbType::UInt16,
        DbType::UInt32,
        DbType::UInt64,
        DbType::VarNumeric,
        DbType::AnsiStringFixedLength,
        DbType::StringFixedLength,
        DbType::Xml,
        DbType::DateTime2,
        DbType::DateTimeOffset,
    ];

    /// Derives the database type for a type code.
    ///
    /// `datetime2` selects [`DbType::DateTime2`] over [`DbType::DateTime`]
    /// for [`TypeCode::DateTime`] columns.
    pub fn coerce(code: TypeCode, datetime2: bool) -> DbType {
        match code {
            TypeCode::Bool => DbType::Boolean,
            TypeCode::Byte => DbType::Byte,
            TypeCode::Char => DbType::StringFixedLength,
            TypeCode::Double => DbType::Double,
            TypeCode::Float => DbType::Single,
            TypeCode::Int32 => DbType::Int32,
            TypeCode::Int64 => DbType::Int64,
            TypeCode::Int16 => DbType::Int16,
            TypeCode::UInt32 => DbType::UInt32,
            TypeCode::UInt64 => DbType::UInt64,
            TypeCode::UInt16 => DbType::UInt16,
            TypeCode::Bytes => DbType::Binary,
            TypeCode::DateTime if datetime2 => DbType::DateTime2,
            TypeCode::DateTime => DbType::DateTime,
            TypeCode::DateTimeOffset => DbType::DateTimeOffset,
            TypeCode::Decimal => DbType::Decimal,
            TypeCode::Guid => DbType::Guid,
            TypeCode::String | TypeCode::Chars => DbType::String,
            TypeCode::SByte => DbType::SByte,
            TypeCode::TimeSpan => DbType::Time,
            TypeCode::Object => DbType::Object,
        }
    }
}

impl From<DbType> for i32 {
    fn from(value: DbType) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for DbType {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        DbType::ALL
            .iter()
            .copied()
            .find(|t| *t as i32 == value)
            .ok_or_else(|| format!("unknown db type {}", value))
    }
}
