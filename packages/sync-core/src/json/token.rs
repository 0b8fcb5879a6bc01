//! Token kinds produced by the JSON reader.

use std::fmt;

/// Kind of the token the reader is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JsonTokenType {
    /// Before the first read, or after the end of the stream
    #[default]
    None,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    PropertyName,
    String,
    Number,
    True,
    False,
    Null,
}

impl JsonTokenType {
    /// Whether the token carries a scalar value.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            JsonTokenType::String
                | JsonTokenType::Number
                | JsonTokenType::True
                | JsonTokenType::False
                | JsonTokenType::Null
        )
    }

    /// Whether the token opens an object or an array.
    pub fn is_container_start(&self) -> bool {
        matches!(self, JsonTokenType::StartObject | JsonTokenType::StartArray)
    }

    /// Whether the token closes an object or an array.
    pub fn is_container_end(&self) -> bool {
        matches!(self, JsonTokenType::EndObject | JsonTokenType::EndArray)
    }
}

impl fmt::Display for JsonTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
