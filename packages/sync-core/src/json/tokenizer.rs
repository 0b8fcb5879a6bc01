//! Resumable JSON tokenizer.
//!
//! [`TokenizerState`] is the whole continuation state between calls: a stack
//! of open containers, the grammar position and the absolute offset. Each
//! call scans at most one token from the start of a byte span. When the span
//! ends inside a token and more input may follow, nothing is consumed and
//! the caller is asked for more data; the same span, extended, is offered
//! again on the next call.

use super::token::JsonTokenType;
use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

/// What the grammar accepts next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Expect {
    /// Any value (document start, after `:` )
    #[default]
    Value,
    /// A value or `]` (right after `[`)
    ValueOrEnd,
    /// A property name or `}` (right after `{`)
    PropertyOrEnd,
    /// A property name (after `,` in an object)
    Property,
    /// The `:` after a property name
    Colon,
    /// `,` or the end of the current container
    CommaOrEnd,
    /// The root value is complete
    Done,
}

enum Transition {
    Push(Container),
    Pop,
    Scalar,
    Property,
}

enum Scan {
    NeedMore,
    End,
    Token(RawToken, Transition),
}

/// One token located in the span passed to [`TokenizerState::next_token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawToken {
    pub kind: JsonTokenType,
    /// Start of the value bytes (inside the quotes for strings)
    pub start: usize,
    /// End of the value bytes, exclusive
    pub end: usize,
    /// Bytes consumed from the start of the span, separators and whitespace included
    pub consumed: usize,
    /// Whether a string token contains escape sequences
    pub escaped: bool,
    /// Nesting depth of the token
    pub depth: usize,
}

/// Continuation state of the tokenizer.
#[derive(Debug, Clone, Default)]
pub(crate) struct TokenizerState {
    stack: Vec<Container>,
    expect: Expect,
    offset: usize,
}

impl TokenizerState {
    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Absolute number of bytes consumed by all tokens so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether a complete root value has been read.
    pub fn is_complete(&self) -> bool {
        self.expect == Expect::Done
    }

    /// Scans the next token from the start of `data`.
    ///
    /// # Arguments
    /// * `data` - Unconsumed bytes
    /// * `is_final` - No bytes follow `data`
    ///
    /// # Returns
    /// `Ok(Some(token))` when a token was read and the state advanced,
    /// `Ok(None)` when more data is needed (`is_final == false`) or the
    /// input is exhausted (`is_final == true`), and an error for malformed
    /// input or a token cut off by the end of the input.
    pub fn next_token(&mut self, data: &[u8], is_final: bool) -> SyncResult<Option<RawToken>> {
        match self.scan(data, is_final)? {
            Scan::NeedMore | Scan::End => Ok(None),
            Scan::Token(mut token, transition) => {
                token.depth = self.apply(transition);
                self.offset += token.consumed;
                Ok(Some(token))
            }
        }
    }

    fn apply(&mut self, transition: Transition) -> usize {
        match transition {
            Transition::Push(container) => {
                let depth = self.stack.len();
                self.stack.push(container);
                self.expect = match container {
                    Container::Object => Expect::PropertyOrEnd,
                    Container::Array => Expect::ValueOrEnd,
                };
                depth
            }
            Transition::Pop => {
                self.stack.pop();
                self.expect = self.after_value();
                self.stack.len()
            }
            Transition::Scalar => {
                self.expect = self.after_value();
                self.stack.len()
            }
            Transition::Property => {
                self.expect = Expect::Colon;
                self.stack.len()
            }
        }
    }

    fn after_value(&self) -> Expect {
        if self.stack.is_empty() {
            Expect::Done
        } else {
            Expect::CommaOrEnd
        }
    }

    fn scan(&self, data: &[u8], is_final: bool) -> SyncResult<Scan> {
        let mut i = skip_whitespace(data, 0);
        let mut expect = self.expect;

        match expect {
            Expect::Done => {
                if i == data.len() {
                    return Ok(if is_final { Scan::End } else { Scan::NeedMore });
                }
                return Err(self.error(i, "unexpected data after the root value"));
            }
            Expect::Colon => {
                if i == data.len() {
                    return Ok(self.starved(is_final));
                }
                if data[i] != b':' {
                    return Err(self.error(i, "expected ':' after property name"));
                }
                i = skip_whitespace(data, i + 1);
                expect = Expect::Value;
            }
            Expect::CommaOrEnd => {
                if i == data.len() {
                    return Ok(self.starved(is_final));
                }
                match data[i] {
                    b',' => {
                        i = skip_whitespace(data, i + 1);
                        expect = match self.stack.last() {
                            Some(Container::Object) => Expect::Property,
                            _ => Expect::Value,
                        };
                    }
                    b']' | b'}' => return self.close(data[i], i),
                    _ => return Err(self.error(i, "expected ',' or end of container")),
                }
            }
            _ => {}
        }

        if i == data.len() {
            return Ok(self.starved(is_final));
        }

        let byte = data[i];
        match expect {
            Expect::PropertyOrEnd if byte == b'}' => self.close(byte, i),
            Expect::PropertyOrEnd | Expect::Property => {
                if byte != b'"' {
                    return Err(self.error(i, "expected property name"));
                }
                self.string(data, i, is_final, JsonTokenType::PropertyName)
            }
            Expect::ValueOrEnd if byte == b']' => self.close(byte, i),
            _ => self.value(data, i, is_final),
        }
    }

    /// Only whitespace (or a separator) is left in the span.
    ///
    /// At the end of the input this ends the token stream even when
    /// containers are still open; [`TokenizerState::is_complete`] tells a
    /// truncated document from a complete one.
    fn starved(&self, is_final: bool) -> Scan {
        if is_final {
            Scan::End
        } else {
            Scan::NeedMore
        }
    }

    /// A token was cut off by the end of the span.
    fn partial(&self, is_final: bool) -> SyncResult<Scan> {
        if is_final {
            Err(SyncError::UnexpectedEndOfJson)
        } else {
            Ok(Scan::NeedMore)
        }
    }

    fn close(&self, byte: u8, i: usize) -> SyncResult<Scan> {
        let (kind, container) = match byte {
            b'}' => (JsonTokenType::EndObject, Container::Object),
            _ => (JsonTokenType::EndArray, Container::Array),
        };
        if self.stack.last() != Some(&container) {
            return Err(self.error(i, "mismatched closing bracket"));
        }
        Ok(Scan::Token(token(kind, i, i + 1, i + 1), Transition::Pop))
    }

    fn value(&self, data: &[u8], i: usize, is_final: bool) -> SyncResult<Scan> {
        match data[i] {
            b'{' => Ok(Scan::Token(
                token(JsonTokenType::StartObject, i, i + 1, i + 1),
                Transition::Push(Container::Object),
            )),
            b'[' => Ok(Scan::Token(
                token(JsonTokenType::StartArray, i, i + 1, i + 1),
                Transition::Push(Container::Array),
            )),
            b'"' => self.string(data, i, is_final, JsonTokenType::String),
            b'-' | b'0'..=b'9' => self.number(data, i, is_final),
            b't' => self.literal(data, i, is_final, b"true", JsonTokenType::True),
            b'f' => self.literal(data, i, is_final, b"false", JsonTokenType::False),
            b'n' => self.literal(data, i, is_final, b"null", JsonTokenType::Null),
            _ => Err(self.error(i, "unexpected character")),
        }
    }

    fn literal(
        &self,
        data: &[u8],
        i: usize,
        is_final: bool,
        literal: &[u8],
        kind: JsonTokenType,
    ) -> SyncResult<Scan> {
        let available = &data[i..data.len().min(i + literal.len())];
        if !literal.starts_with(available) {
            return Err(self.error(i, "invalid literal"));
        }
        if available.len() < literal.len() {
            return self.partial(is_final);
        }
        let end = i + literal.len();
        Ok(Scan::Token(token(kind, i, end, end), Transition::Scalar))
    }

    fn number(&self, data: &[u8], start: usize, is_final: bool) -> SyncResult<Scan> {
        let len = data.len();
        let mut i = start;
        if data[i] == b'-' {
            i += 1;
        }

        match data.get(i) {
            None => return self.partial(is_final),
            Some(b'0') => i += 1,
            Some(b'1'..=b'9') => i = skip_digits(data, i + 1),
            Some(_) => return Err(self.error(i, "invalid number")),
        }

        if i < len && data[i] == b'.' {
            let digits = i + 1;
            i = skip_digits(data, digits);
            if i == digits {
                return if i == len {
                    self.partial(is_final)
                } else {
                    Err(self.error(i, "expected digit after decimal point"))
                };
            }
        }

        if i < len && (data[i] == b'e' || data[i] == b'E') {
            i += 1;
            if i < len && (data[i] == b'+' || data[i] == b'-') {
                i += 1;
            }
            let digits = i;
            i = skip_digits(data, digits);
            if i == digits {
                return if i == len {
                    self.partial(is_final)
                } else {
                    Err(self.error(i, "expected digit in exponent"))
                };
            }
        }

        if i == len {
            if !is_final {
                return Ok(Scan::NeedMore);
            }
        } else if !is_delimiter(data[i]) {
            return Err(self.error(i, "invalid number"));
        }

        Ok(Scan::Token(
            token(JsonTokenType::Number, start, i, i),
            Transition::Scalar,
        ))
    }

    fn string(
        &self,
        data: &[u8],
        quote: usize,
        is_final: bool,
        kind: JsonTokenType,
    ) -> SyncResult<Scan> {
        let len = data.len();
        let mut i = quote + 1;
        let mut escaped = false;

        loop {
            if i >= len {
                return self.partial(is_final);
            }
            match data[i] {
                b'"' => break,
                b'\\' => {
                    escaped = true;
                    let Some(&escape) = data.get(i + 1) else {
                        return self.partial(is_final);
                    };
                    match escape {
                        b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => i += 2,
                        b'u' => {
                            let hex = &data[(i + 2).min(len)..len.min(i + 6)];
                            if !hex.iter().all(u8::is_ascii_hexdigit) {
                                return Err(self.error(i, "invalid unicode escape"));
                            }
                            if hex.len() < 4 {
                                return self.partial(is_final);
                            }
                            i += 6;
                        }
                        _ => return Err(self.error(i, "invalid escape sequence")),
                    }
                }
                byte if byte < 0x20 => {
                    return Err(self.error(i, "control character in string"));
                }
                byte if byte < 0x80 => i += 1,
                byte => {
                    let width = utf8_width(byte);
                    if width == 0 {
                        return Err(SyncError::InvalidUtf8 {
                            position: self.offset + i,
                        });
                    }
                    if i + width > len {
                        return self.partial(is_final);
                    }
                    if std::str::from_utf8(&data[i..i + width]).is_err() {
                        return Err(SyncError::InvalidUtf8 {
                            position: self.offset + i,
                        });
                    }
                    i += width;
                }
            }
        }

        let transition = if kind == JsonTokenType::PropertyName {
            Transition::Property
        } else {
            Transition::Scalar
        };
        let mut raw = token(kind, quote + 1, i, i + 1);
        raw.escaped = escaped;
        Ok(Scan::Token(raw, transition))
    }

    fn error(&self, i: usize, message: &str) -> SyncError {
        SyncError::invalid_json(self.offset + i, message)
    }
}

fn token(kind: JsonTokenType, start: usize, end: usize, consumed: usize) -> RawToken {
    RawToken {
        kind,
        start,
        end,
        consumed,
        escaped: false,
        depth: 0,
    }
}

fn skip_whitespace(data: &[u8], mut i: usize) -> usize {
    while i < data.len() && matches!(data[i], b' ' | b'\t' | b'\n' | b'\r') {
        i += 1;
    }
    i
}

fn skip_digits(data: &[u8], mut i: usize) -> usize {
    while i < data.len() && data[i].is_ascii_digit() {
        i += 1;
    }
    i
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | b',' | b']' | b'}')
}

/// Length of the UTF-8 sequence introduced by `lead`, 0 if invalid.
fn utf8_width(lead: u8) -> usize {
    match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}
