//! Compact wire codes for column value types.

use std::fmt;

/// Primitive value types a column can declare.
///
/// Each variant has a stable short code used in serialized schemas (`"1"`..`"20"`,
/// `"-1"` for [`TypeCode::Object`]). The codes must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Bool,
    Byte,
    Char,
    Double,
    Float,
    Int32,
    Int64,
    Int16,
    UInt32,
    UInt64,
    UInt16,
    Bytes,
    DateTime,
    DateTimeOffset,
    Decimal,
    Guid,
    String,
    SByte,
    TimeSpan,
    Chars,
    /// Unknown or untyped column
    Object,
}

impl TypeCode {
    /// All fixed codes, in code order, excluding [`TypeCode::Object`].
    pub const FIXED: [TypeCode; 20] = [
        TypeCode::Bool,
        TypeCode::Byte,
        TypeCode::Char,
        TypeCode::Double,
        TypeCode::Float,
        TypeCode::Int32,
        TypeCode::Int64,
        TypeCode::Int16,
        TypeCode::UInt32,
        TypeCode::UInt64,
        TypeCode::UInt16,
        TypeCode::Bytes,
        TypeCode::DateTime,
        TypeCode::DateTimeOffset,
        TypeCode::Decimal,
        TypeCode::Guid,
        TypeCode::String,
        TypeCode::SByte,
        TypeCode::TimeSpan,
        TypeCode::Chars,
    ];

    /// Returns the short wire code for this type.
    pub fn code(&self) -> &'static str {
        match self {
            TypeCode::Bool => "1",
            TypeCode::Byte => "2",
            TypeCode::Char => "3",
            TypeCode::Double => "4",
            TypeCode::Float => "5",
            TypeCode::Int32 => "6",
            TypeCode::Int64 => "7",
            TypeCode::Int16 => "8",
            TypeCode::UInt32 => "9",
            TypeCode::UInt64 => "10",
            TypeCode::UInt16 => "11",
            TypeCode::Bytes => "12",
            TypeCode::DateTime => "13",
            TypeCode::DateTimeOffset => "14",
            TypeCode::Decimal => "15",
            TypeCode::Guid => "16",
            TypeCode::String => "17",
            TypeCode::SByte => "18",
            TypeCode::TimeSpan => "19",
            TypeCode::Chars => "20",
            TypeCode::Object => "-1",
        }
    }

    /// Returns the long type name for this type.
    pub fn type_name(&self) -> &'static str {
        match self {
            TypeCode::Bool => "bool",
            TypeCode::Byte => "u8",
            TypeCode::Char => "char",
            TypeCode::Double => "f64",
            TypeCode::Float => "f32",
            TypeCode::Int32 => "i32",
            TypeCode::Int64 => "i64",
            TypeCode::Int16 => "i16",
            TypeCode::UInt32 => "u32",
            TypeCode::UInt64 => "u64",
            TypeCode::UInt16 => "u16",
            TypeCode::Bytes => "bytes",
            TypeCode::DateTime => "datetime",
            TypeCode::DateTimeOffset => "datetimeoffset",
            TypeCode::Decimal => "decimal",
            TypeCode::Guid => "guid",
            TypeCode::String => "string",
            TypeCode::SByte => "i8",
            TypeCode::TimeSpan => "timespan",
            TypeCode::Chars => "chars",
            TypeCode::Object => "object",
        }
    }

    /// Resolves a short wire code (`"1"`..`"20"`, `"-1"`).
    pub fn from_code(code: &str) -> Option<TypeCode> {
        if code == "-1" {
            return Some(TypeCode::Object);
        }
        Self::FIXED.iter().copied().find(|t| t.code() == code)
    }

    /// Resolves either a short wire code or a long type name.
    ///
    /// Type names are matched case-insensitively. Returns `None` for a string
    /// that is neither, which callers keep verbatim as an opaque type name.
    pub fn from_code_or_name(value: &str) -> Option<TypeCode> {
        Self::from_code(value).or_else(|| {
            Self::FIXED
                .iter()
                .copied()
                .chain(std::iter::once(TypeCode::Object))
                .find(|t| t.type_name().eq_ignore_ascii_case(value))
        })
    }

    /// Returns true for types whose default value is a zeroed value
    /// rather than null.
    pub fn is_value_type(&self) -> bool {
        !matches!(
            self,
            TypeCode::String | TypeCode::Bytes | TypeCode::Chars | TypeCode::Object
        )
    }

    /// Returns true for the integral numeric types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeCode::Byte
                | TypeCode::SByte
                | TypeCode::Int16
                | TypeCode::Int32
                | TypeCode::Int64
                | TypeCode::UInt16
                | TypeCode::UInt32
                | TypeCode::UInt64
        )
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
