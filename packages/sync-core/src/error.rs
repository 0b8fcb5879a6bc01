//! Sync core error types.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by the data model, the JSON tokenizer and the batch serializer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Table not found in a schema set
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Column not found in table
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Column name already used in the column collection
    #[error("Column '{column}' already exists")]
    DuplicateColumn { column: String },

    /// Table already exists in a schema set
    #[error("Table '{table}' already exists")]
    DuplicateTable { table: String },

    /// A primary key name does not match any column
    #[error("Primary key '{key}' does not match any column of table '{table}'")]
    PrimaryKeyNotFound { table: String, key: String },

    /// Two rows being compared carry a different number of key values
    #[error("Primary key count mismatch: expected {expected}, got {got}")]
    PrimaryKeyCountMismatch { expected: usize, got: usize },

    /// A row tuple does not match the column count of its table
    #[error("Row has {got} values but table '{table}' has {expected} columns")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        got: usize,
    },

    /// Reorder target outside the column collection
    #[error("Cannot move column '{column}' to position {position} (columns: {len})")]
    OrdinalOutOfRange {
        column: String,
        position: usize,
        len: usize,
    },

    /// Value cannot be represented in the requested type
    #[error("Cannot convert '{value}' to {target}")]
    TypeConversion { value: String, target: String },

    /// Unknown row state code
    #[error("Invalid row state: {0}")]
    InvalidRowState(i64),

    /// Malformed JSON input
    #[error("Invalid JSON at byte {position}: {message}")]
    InvalidJson { position: usize, message: String },

    /// Malformed UTF-8 inside a string token
    #[error("Invalid UTF-8 sequence at byte {position}")]
    InvalidUtf8 { position: usize },

    /// Input ended inside a token or an open container
    #[error("Unexpected end of JSON input")]
    UnexpectedEndOfJson,

    /// A single token does not fit into the largest buffer allowed
    #[error("JSON buffer limit exceeded: requested {requested} bytes, limit {limit} bytes")]
    BufferLimitExceeded { requested: usize, limit: usize },

    /// Typed accessor used on a token of the wrong kind
    #[error("Cannot read {expected} from a {actual} token")]
    InvalidTokenType { expected: String, actual: String },

    /// Token text not fully consumed by a numeric/date/guid parser
    #[error("'{text}' is not a valid {target}")]
    FormatError { target: String, text: String },

    /// Writing without an open batch file
    #[error("No batch file is open")]
    StreamNotOpen,

    /// Batch part content does not match its recorded checksum
    #[error("Checksum mismatch for '{file}': expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        file: String,
        expected: u32,
        actual: u32,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),

    /// Disk full
    #[error("Disk full: {0}")]
    DiskFull(String),
}

impl SyncError {
    /// Creates an invalid JSON error at the given absolute byte position.
    pub fn invalid_json(position: usize, message: impl Into<String>) -> Self {
        Self::InvalidJson {
            position,
            message: message.into(),
        }
    }

    /// Creates a format error for text that did not parse as `target`.
    pub fn format(target: &str, text: impl Into<String>) -> Self {
        Self::FormatError {
            target: target.to_string(),
            text: text.into(),
        }
    }

    /// Creates a type conversion error.
    pub fn conversion(value: impl std::fmt::Display, target: impl std::fmt::Display) -> Self {
        Self::TypeConversion {
            value: value.to_string(),
            target: target.to_string(),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(error: serde_json::Error) -> Self {
        SyncError::SerializationError(error.to_string())
    }
}
