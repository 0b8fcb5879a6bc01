//! Dynamically typed cell values.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeDelta};
use uuid::Uuid;

use super::decimal::Decimal;
use super::type_code::TypeCode;
use crate::error::SyncError;

/// Value stored in one row slot.
///
/// The variant is the runtime tag of the value; the owning column's
/// [`TypeCode`] is the declared type. Writers keep them in agreement by
/// converting with [`SyncValue::convert_to`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SyncValue {
    /// SQL NULL / missing value
    #[default]
    Null,
    Bool(bool),
    Byte(u8),
    SByte(i8),
    Char(char),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    TimeSpan(TimeDelta),
    Guid(Uuid),
    String(String),
    Bytes(Vec<u8>),
    Chars(Vec<char>),
}

impl SyncValue {
    /// Returns the type code matching the runtime tag, or `None` for null.
    pub fn type_code(&self) -> Option<TypeCode> {
        Some(match self {
            SyncValue::Null => return None,
            SyncValue::Bool(_) => TypeCode::Bool,
            SyncValue::Byte(_) => TypeCode::Byte,
            SyncValue::SByte(_) => TypeCode::SByte,
            SyncValue::Char(_) => TypeCode::Char,
            SyncValue::Int16(_) => TypeCode::Int16,
            SyncValue::Int32(_) => TypeCode::Int32,
            SyncValue::Int64(_) => TypeCode::Int64,
            SyncValue::UInt16(_) => TypeCode::UInt16,
            SyncValue::UInt32(_) => TypeCode::UInt32,
            SyncValue::UInt64(_) => TypeCode::UInt64,
            SyncValue::Float(_) => TypeCode::Float,
            SyncValue::Double(_) => TypeCode::Double,
            SyncValue::Decimal(_) => TypeCode::Decimal,
            SyncValue::DateTime(_) => TypeCode::DateTime,
            SyncValue::DateTimeOffset(_) => TypeCode::DateTimeOffset,
            SyncValue::TimeSpan(_) => TypeCode::TimeSpan,
            SyncValue::Guid(_) => TypeCode::Guid,
            SyncValue::String(_) => TypeCode::String,
            SyncValue::Bytes(_) => TypeCode::Bytes,
            SyncValue::Chars(_) => TypeCode::Chars,
        })
    }

    /// Returns a zero-initialized value for value types, `Null` otherwise.
    pub fn default_for(code: TypeCode) -> SyncValue {
        match code {
            TypeCode::Bool => SyncValue::Bool(false),
            TypeCode::Byte => SyncValue::Byte(0),
            TypeCode::SByte => SyncValue::SByte(0),
            TypeCode::Char => SyncValue::Char('\0'),
            TypeCode::Int16 => SyncValue::Int16(0),
            TypeCode::Int32 => SyncValue::Int32(0),
            TypeCode::Int64 => SyncValue::Int64(0),
            TypeCode::UInt16 => SyncValue::UInt16(0),
            TypeCode::UInt32 => SyncValue::UInt32(0),
            TypeCode::UInt64 => SyncValue::UInt64(0),
            TypeCode::Float => SyncValue::Float(0.0),
            TypeCode::Double => SyncValue::Double(0.0),
            TypeCode::Decimal => SyncValue::Decimal(Decimal::default()),
            TypeCode::DateTime => SyncValue::DateTime(NaiveDateTime::default()),
            TypeCode::DateTimeOffset => {
                SyncValue::DateTimeOffset(NaiveDateTime::default().and_utc().fixed_offset())
            }
            TypeCode::TimeSpan => SyncValue::TimeSpan(TimeDelta::zero()),
            TypeCode::Guid => SyncValue::Guid(Uuid::nil()),
            TypeCode::String | TypeCode::Bytes | TypeCode::Chars | TypeCode::Object => {
                SyncValue::Null
            }
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, SyncValue::Null)
    }

    /// Returns the string payload if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SyncValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `i64` if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            SyncValue::Byte(v) => Some(i64::from(v)),
            SyncValue::SByte(v) => Some(i64::from(v)),
            SyncValue::Int16(v) => Some(i64::from(v)),
            SyncValue::Int32(v) => Some(i64::from(v)),
            SyncValue::Int64(v) => Some(v),
            SyncValue::UInt16(v) => Some(i64::from(v)),
            SyncValue::UInt32(v) => Some(i64::from(v)),
            SyncValue::UInt64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Returns the value as `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            SyncValue::Float(v) => Some(f64::from(v)),
            SyncValue::Double(v) => Some(v),
            SyncValue::Decimal(v) => Some(v.to_f64()),
            SyncValue::UInt64(v) => Some(v as f64),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Returns the boolean payload if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SyncValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Textual form used on the wire for string-encoded types
    /// (dates, guids, timespans, blobs, chars). `None` for numbers, booleans and null.
    pub fn to_wire_string(&self) -> Option<String> {
        match self {
            SyncValue::Char(c) => Some(c.to_string()),
            SyncValue::DateTime(dt) => Some(format_date_time(dt)),
            SyncValue::DateTimeOffset(dt) => {
                Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
            }
            SyncValue::TimeSpan(span) => Some(format_time_span(span)),
            SyncValue::Guid(g) => Some(g.hyphenated().to_string()),
            SyncValue::String(s) => Some(s.clone()),
            SyncValue::Bytes(b) => Some(BASE64.encode(b)),
            SyncValue::Chars(c) => Some(c.iter().collect()),
            _ => None,
        }
    }
}

impl fmt::Display for SyncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncValue::Null => f.write_str("<NULL />"),
            SyncValue::Bool(v) => write!(f, "{}", v),
            SyncValue::Byte(v) => write!(f, "{}", v),
            SyncValue::SByte(v) => write!(f, "{}", v),
            SyncValue::Int16(v) => write!(f, "{}", v),
            SyncValue::Int32(v) => write!(f, "{}", v),
            SyncValue::Int64(v) => write!(f, "{}", v),
            SyncValue::UInt16(v) => write!(f, "{}", v),
            SyncValue::UInt32(v) => write!(f, "{}", v),
            SyncValue::UInt64(v) => write!(f, "{}", v),
            SyncValue::Float(v) => write!(f, "{:?}", v),
            SyncValue::Double(v) => write!(f, "{:?}", v),
            SyncValue::Decimal(v) => write!(f, "{}", v),
            other => match other.to_wire_string() {
                Some(text) => f.write_str(&text),
                None => Ok(()),
            },
        }
    }
}

/// Formats a naive date time as `YYYY-MM-DDTHH:MM:SS[.fffffffff]`,
/// trimming trailing fractional zeros.
pub fn format_date_time(value: &NaiveDateTime) -> String {
    let mut text = value.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = value.and_utc().timestamp_subsec_nanos();
    if nanos != 0 {
        let frac = format!("{:09}", nanos);
        text.push('.');
        text.push_str(frac.trim_end_matches('0'));
    }
    text
}

/// Parses the output of [`format_date_time`] (fraction optional).
pub fn parse_date_time(text: &str) -> Result<NaiveDateTime, SyncError> {
    text.parse::<NaiveDateTime>()
        .map_err(|_| SyncError::format("datetime", text))
}

/// Parses an RFC 3339 date time carrying an explicit offset.
pub fn parse_date_time_offset(text: &str) -> Result<DateTime<FixedOffset>, SyncError> {
    DateTime::parse_from_rfc3339(text).map_err(|_| SyncError::format("datetimeoffset", text))
}

/// Formats a time span as `[-][d.]hh:mm:ss[.fffffff]` (100ns ticks).
pub fn format_time_span(span: &TimeDelta) -> String {
    let negative = *span < TimeDelta::zero();
    let abs = span.abs();
    let total_seconds = abs.num_seconds();
    let ticks = abs.subsec_nanos() / 100;
    let days = total_seconds / 86_400;
    let hours = (total_seconds / 3600) % 24;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;

    let mut text = String::new();
    if negative {
        text.push('-');
    }
    if days > 0 {
        text.push_str(&format!("{}.", days));
    }
    text.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    if ticks > 0 {
        text.push_str(&format!(".{:07}", ticks));
    }
    text
}

/// Parses the output of [`format_time_span`].
pub fn parse_time_span(text: &str) -> Result<TimeDelta, SyncError> {
    let err = || SyncError::format("timespan", text);
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let parts: Vec<&str> = body.split(':').collect();
    if parts.len() != 3 {
        return Err(err());
    }
    let (days, hours) = match parts[0].split_once('.') {
        Some((d, h)) => (parse_digits(d).ok_or_else(err)?, parse_digits(h).ok_or_else(err)?),
        None => (0, parse_digits(parts[0]).ok_or_else(err)?),
    };
    let minutes = parse_digits(parts[1]).ok_or_else(err)?;
    let (seconds, ticks) = match parts[2].split_once('.') {
        Some((s, frac)) => {
            if frac.is_empty() || frac.len() > 7 {
                return Err(err());
            }
            let padded = format!("{:0<7}", frac);
            (parse_digits(s).ok_or_else(err)?, parse_digits(&padded).ok_or_else(err)?)
        }
        None => (parse_digits(parts[2]).ok_or_else(err)?, 0),
    };
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(err());
    }

    let total_seconds = days
        .checked_mul(86_400)
        .and_then(|s| s.checked_add(hours * 3600 + minutes * 60 + seconds))
        .ok_or_else(err)?;
    let span = TimeDelta::try_seconds(total_seconds)
        .and_then(|s| s.checked_add(&TimeDelta::nanoseconds(ticks * 100)))
        .ok_or_else(err)?;
    Ok(if negative { -span } else { span })
}

fn parse_digits(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Decodes standard base64.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, SyncError> {
    BASE64
        .decode(text)
        .map_err(|_| SyncError::format("base64", text))
}

impl From<bool> for SyncValue {
    fn from(v: bool) -> Self {
        SyncValue::Bool(v)
    }
}

impl From<i16> for SyncValue {
    fn from(v: i16) -> Self {
        SyncValue::Int16(v)
    }
}

impl From<i32> for SyncValue {
    fn from(v: i32) -> Self {
        SyncValue::Int32(v)
    }
}

impl From<i64> for SyncValue {
    fn from(v: i64) -> Self {
        SyncValue::Int64(v)
    }
}

impl From<u64> for SyncValue {
    fn from(v: u64) -> Self {
        SyncValue::UInt64(v)
    }
}

impl From<f64> for SyncValue {
    fn from(v: f64) -> Self {
        SyncValue::Double(v)
    }
}

impl From<&str> for SyncValue {
    fn from(v: &str) -> Self {
        SyncValue::String(v.to_string())
    }
}

impl From<String> for SyncValue {
    fn from(v: String) -> Self {
        SyncValue::String(v)
    }
}

impl From<Uuid> for SyncValue {
    fn from(v: Uuid) -> Self {
        SyncValue::Guid(v)
    }
}

impl From<Decimal> for SyncValue {
    fn from(v: Decimal) -> Self {
        SyncValue::Decimal(v)
    }
}

impl From<Vec<u8>> for SyncValue {
    fn from(v: Vec<u8>) -> Self {
        SyncValue::Bytes(v)
    }
}

impl<T: Into<SyncValue>> From<Option<T>> for SyncValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SyncValue::Null)
    }
}
