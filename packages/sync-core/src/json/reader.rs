//! Streaming JSON reader over any byte source.
//!
//! The reader owns one buffer. Bytes are pulled from the source only when the
//! tokenizer cannot finish a token with what is buffered; unconsumed bytes are
//! then moved to the front of the buffer and the rest is refilled. When a
//! single token does not fit into the whole buffer, the buffer doubles, up to
//! a hard ceiling.

use std::borrow::Cow;
use std::io::{ErrorKind, Read};

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use tracing::trace;
use uuid::Uuid;
use zeroize::Zeroize;

use super::escape::unescape;
use super::token::JsonTokenType;
use super::tokenizer::{RawToken, TokenizerState};
use crate::config::{SyncConfig, DEFAULT_JSON_BUFFER_SIZE, DEFAULT_JSON_MAX_BUFFER_SIZE};
use crate::error::{SyncError, SyncResult};
use crate::io_utils::classify_io_error;
use crate::types::inference::{infer_number, infer_string};
use crate::types::{
    decode_base64, parse_date_time, parse_date_time_offset, parse_time_span, Decimal, SyncValue,
};

/// Generates the non-failing `try_get_*` and the advancing `read_as_*`
/// variants of a `get_*` accessor.
macro_rules! accessor_variants {
    ($($get:ident => $try_get:ident, $read_as:ident: $ty:ty;)*) => {
        $(
            #[doc = concat!("Like [`JsonReader::", stringify!($get), "`], `None` instead of an error.")]
            pub fn $try_get(&self) -> Option<$ty> {
                self.$get().ok()
            }

            #[doc = concat!("Reads the next token, then [`JsonReader::", stringify!($get), "`]. `None` for a null token.")]
            pub fn $read_as(&mut self) -> SyncResult<Option<$ty>> {
                self.read_as(Self::$get)
            }
        )*
    };
}

/// Forward-only JSON token reader.
///
/// Not safe for concurrent use; give each stream its own reader. The buffer
/// is wiped when the reader is dropped.
pub struct JsonReader<R: Read> {
    source: R,
    buffer: Vec<u8>,
    data_pos: usize,
    data_len: usize,
    is_final_block: bool,
    state: TokenizerState,
    bytes_consumed: usize,
    max_buffer_size: usize,
    token: Option<RawToken>,
    finished: bool,
}

impl<R: Read> JsonReader<R> {
    /// Creates a reader with the default buffer sizes.
    pub fn new(source: R) -> Self {
        Self::with_buffer_size(source, DEFAULT_JSON_BUFFER_SIZE, DEFAULT_JSON_MAX_BUFFER_SIZE)
    }

    /// Creates a reader using the buffer sizes of `config`.
    pub fn with_config(source: R, config: &SyncConfig) -> Self {
        Self::with_buffer_size(source, config.json_buffer_size, config.json_max_buffer_size)
    }

    /// Creates a reader with explicit buffer sizes.
    ///
    /// # Arguments
    /// * `source` - Byte source
    /// * `buffer_size` - Initial buffer size in bytes (at least 1)
    /// * `max_buffer_size` - Ceiling for buffer growth in bytes
    pub fn with_buffer_size(source: R, buffer_size: usize, max_buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        Self {
            source,
            buffer: vec![0u8; buffer_size],
            data_pos: 0,
            data_len: 0,
            is_final_block: false,
            state: TokenizerState::default(),
            bytes_consumed: 0,
            max_buffer_size: max_buffer_size.max(buffer_size),
            token: None,
            finished: false,
        }
    }

    /// Advances to the next token.
    ///
    /// # Returns
    /// `Ok(true)` when positioned on a new token, `Ok(false)` at the end of
    /// the stream.
    pub fn read(&mut self) -> SyncResult<bool> {
        self.token = None;
        if self.finished {
            return Ok(false);
        }

        self.data_pos += self.bytes_consumed;
        self.data_len -= self.bytes_consumed;
        self.bytes_consumed = 0;

        loop {
            let data = &self.buffer[self.data_pos..self.data_pos + self.data_len];
            let next = match self.state.next_token(data, self.is_final_block) {
                Ok(next) => next,
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                }
            };

            match next {
                Some(token) => {
                    self.bytes_consumed = token.consumed;
                    self.token = Some(token);
                    return Ok(true);
                }
                None if self.is_final_block => {
                    self.finished = true;
                    return Ok(false);
                }
                None => {
                    self.compact();
                    if self.data_len == self.buffer.len() {
                        self.grow()?;
                    }
                    self.fill()?;
                }
            }
        }
    }

    fn compact(&mut self) {
        if self.data_pos > 0 {
            self.buffer
                .copy_within(self.data_pos..self.data_pos + self.data_len, 0);
            self.data_pos = 0;
        }
    }

    fn grow(&mut self) -> SyncResult<()> {
        let requested = self.buffer.len().saturating_mul(2);
        if requested > self.max_buffer_size {
            self.finished = true;
            return Err(SyncError::BufferLimitExceeded {
                requested,
                limit: self.max_buffer_size,
            });
        }
        trace!("Growing JSON buffer from {} to {} bytes", self.buffer.len(), requested);
        self.buffer.resize(requested, 0);
        Ok(())
    }

    /// Reads until the buffer is full or the source reports end of input.
    fn fill(&mut self) -> SyncResult<()> {
        while self.data_len < self.buffer.len() {
            match self.source.read(&mut self.buffer[self.data_len..]) {
                Ok(0) => {
                    self.is_final_block = true;
                    break;
                }
                Ok(n) => self.data_len += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.finished = true;
                    return Err(classify_io_error(e, "Failed to read JSON source"));
                }
            }
        }
        Ok(())
    }

    /// Kind of the current token.
    pub fn token_type(&self) -> JsonTokenType {
        self.token.map_or(JsonTokenType::None, |t| t.kind)
    }

    /// Nesting depth of the current token.
    ///
    /// Container starts report the depth outside the container, container
    /// ends the depth after closing it.
    pub fn depth(&self) -> usize {
        self.token.map_or(self.state.depth(), |t| t.depth)
    }

    /// Bytes consumed by the last token, including preceding separators.
    pub fn bytes_consumed(&self) -> usize {
        self.bytes_consumed
    }

    /// Total bytes consumed since the start of the stream.
    pub fn position(&self) -> usize {
        self.state.offset()
    }

    /// Current buffer size in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Whether a complete root value was read. False for a truncated document.
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Raw bytes of the current token (string contents without quotes).
    pub fn value_span(&self) -> &[u8] {
        match self.token {
            Some(t) => &self.buffer[self.data_pos + t.start..self.data_pos + t.end],
            None => &[],
        }
    }

    fn span_position(&self) -> usize {
        let start = self.token.map_or(0, |t| t.start);
        self.state.offset() - self.bytes_consumed + start
    }

    fn expect(&self, expected: &str, kinds: &[JsonTokenType]) -> SyncResult<RawToken> {
        match self.token {
            Some(t) if kinds.contains(&t.kind) => Ok(t),
            _ => Err(SyncError::InvalidTokenType {
                expected: expected.to_string(),
                actual: self.token_type().to_string(),
            }),
        }
    }

    fn number_text(&self, target: &str) -> SyncResult<&str> {
        self.expect(target, &[JsonTokenType::Number])?;
        std::str::from_utf8(self.value_span()).map_err(|_| SyncError::InvalidUtf8 {
            position: self.span_position(),
        })
    }

    fn string_text(&self, target: &str) -> SyncResult<Cow<'_, str>> {
        let token = self.expect(target, &[JsonTokenType::String, JsonTokenType::PropertyName])?;
        if token.escaped {
            return unescape(self.value_span(), self.span_position()).map(Cow::Owned);
        }
        std::str::from_utf8(self.value_span())
            .map(Cow::Borrowed)
            .map_err(|e| SyncError::InvalidUtf8 {
                position: self.span_position() + e.valid_up_to(),
            })
    }

    fn parse_number<T: std::str::FromStr>(&self, target: &str) -> SyncResult<T> {
        let text = self.number_text(target)?;
        text.parse::<T>().map_err(|_| SyncError::format(target, text))
    }

    fn parse_string<T>(
        &self,
        target: &str,
        parse: impl FnOnce(&str) -> Result<T, SyncError>,
    ) -> SyncResult<T> {
        let text = self.string_text(target)?;
        parse(&text).map_err(|_| SyncError::format(target, text.as_ref()))
    }

    fn read_as<T>(&mut self, get: impl FnOnce(&Self) -> SyncResult<T>) -> SyncResult<Option<T>> {
        if !self.read()? {
            return Err(SyncError::UnexpectedEndOfJson);
        }
        if self.token_type() == JsonTokenType::Null {
            return Ok(None);
        }
        get(self).map(Some)
    }

    /// Decoded text of a string or property name token.
    pub fn get_string(&self) -> SyncResult<String> {
        self.string_text("string").map(Cow::into_owned)
    }

    /// Value of a `true`/`false` token.
    pub fn get_bool(&self) -> SyncResult<bool> {
        let token = self.expect("bool", &[JsonTokenType::True, JsonTokenType::False])?;
        Ok(token.kind == JsonTokenType::True)
    }

    pub fn get_i32(&self) -> SyncResult<i32> {
        self.parse_number("i32")
    }

    pub fn get_i64(&self) -> SyncResult<i64> {
        self.parse_number("i64")
    }

    pub fn get_u64(&self) -> SyncResult<u64> {
        self.parse_number("u64")
    }

    pub fn get_f64(&self) -> SyncResult<f64> {
        self.parse_number("f64")
    }

    pub fn get_f32(&self) -> SyncResult<f32> {
        self.parse_number("f32")
    }

    /// Exact decimal value of a number token.
    pub fn get_decimal(&self) -> SyncResult<Decimal> {
        self.parse_number("decimal")
    }

    pub fn get_guid(&self) -> SyncResult<Uuid> {
        self.parse_string("guid", |s| {
            Uuid::parse_str(s).map_err(|_| SyncError::format("guid", s))
        })
    }

    /// Date time without offset, e.g. `2024-05-01T10:00:00.5`.
    pub fn get_date_time(&self) -> SyncResult<NaiveDateTime> {
        self.parse_string("datetime", parse_date_time)
    }

    /// RFC 3339 date time with offset.
    pub fn get_date_time_offset(&self) -> SyncResult<DateTime<FixedOffset>> {
        self.parse_string("datetimeoffset", parse_date_time_offset)
    }

    pub fn get_time_span(&self) -> SyncResult<chrono::TimeDelta> {
        self.parse_string("timespan", parse_time_span)
    }

    /// Bytes of a base64 string token.
    pub fn get_bytes_from_base64(&self) -> SyncResult<Vec<u8>> {
        self.parse_string("base64", decode_base64)
    }

    accessor_variants! {
        get_string => try_get_string, read_as_string: String;
        get_bool => try_get_bool, read_as_bool: bool;
        get_i32 => try_get_i32, read_as_i32: i32;
        get_i64 => try_get_i64, read_as_i64: i64;
        get_u64 => try_get_u64, read_as_u64: u64;
        get_f64 => try_get_f64, read_as_f64: f64;
        get_f32 => try_get_f32, read_as_f32: f32;
        get_decimal => try_get_decimal, read_as_decimal: Decimal;
        get_guid => try_get_guid, read_as_guid: Uuid;
        get_date_time => try_get_date_time, read_as_date_time: NaiveDateTime;
        get_date_time_offset => try_get_date_time_offset, read_as_date_time_offset: DateTime<FixedOffset>;
        get_time_span => try_get_time_span, read_as_time_span: chrono::TimeDelta;
        get_bytes_from_base64 => try_get_bytes_from_base64, read_as_bytes_from_base64: Vec<u8>;
    }

    /// Inferred value of the current token.
    ///
    /// Strings that parse as a date with offset become `DateTimeOffset`,
    /// integers that fit 64 bits become `Int64`, other numbers `Double`.
    /// Property names are plain strings; container tokens yield `Null`.
    pub fn current_value(&self) -> SyncResult<SyncValue> {
        match self.token_type() {
            JsonTokenType::String => Ok(infer_string(self.get_string()?)),
            JsonTokenType::PropertyName => Ok(SyncValue::String(self.get_string()?)),
            JsonTokenType::Number => infer_number(self.number_text("number")?),
            JsonTokenType::True => Ok(SyncValue::Bool(true)),
            JsonTokenType::False => Ok(SyncValue::Bool(false)),
            _ => Ok(SyncValue::Null),
        }
    }

    /// Skips the current value.
    ///
    /// On a property name this advances once. On a container start it reads
    /// until the matching end; reaching the end of the stream first is an error.
    /// On any other token it does nothing.
    pub fn skip(&mut self) -> SyncResult<()> {
        match self.token_type() {
            JsonTokenType::PropertyName => {
                if !self.read()? {
                    return Err(SyncError::UnexpectedEndOfJson);
                }
                Ok(())
            }
            JsonTokenType::StartObject | JsonTokenType::StartArray => {
                let depth = self.depth();
                loop {
                    if !self.read()? {
                        return Err(SyncError::UnexpectedEndOfJson);
                    }
                    if self.token_type().is_container_end() && self.depth() == depth {
                        return Ok(());
                    }
                }
            }
            _ => Ok(()),
        }
    }

    /// Lazy sequence of `(token type, depth, inferred value)` for the rest
    /// of the stream. Single pass; stops after the first error.
    pub fn values(&mut self) -> JsonValues<'_, R> {
        JsonValues {
            reader: self,
            done: false,
        }
    }

    /// Returns the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }
}

impl<R: Read> Drop for JsonReader<R> {
    fn drop(&mut self) {
        self.buffer.zeroize();
    }
}

/// Iterator returned by [`JsonReader::values`].
pub struct JsonValues<'a, R: Read> {
    reader: &'a mut JsonReader<R>,
    done: bool,
}

impl<R: Read> Iterator for JsonValues<'_, R> {
    type Item = SyncResult<(JsonTokenType, usize, SyncValue)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.reader.read() {
            Ok(true) => self
                .reader
                .current_value()
                .map(|value| (self.reader.token_type(), self.reader.depth(), value)),
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}
