//! Conversions between value variants.
//!
//! Used wherever values produced by one provider (or inferred from a batch
//! file) must be compared with or stored under a column's declared type.

use chrono::TimeDelta;
use uuid::Uuid;

use super::decimal::Decimal;
use super::type_code::TypeCode;
use super::value::{
    decode_base64, parse_date_time, parse_date_time_offset, parse_time_span, SyncValue,
};
use crate::error::{SyncError, SyncResult};

impl SyncValue {
    /// Converts this value to the representation of `target`.
    ///
    /// Null converts to null and [`TypeCode::Object`] accepts any value
    /// unchanged. Narrowing conversions are range checked and fail rather
    /// than truncate.
    pub fn convert_to(&self, target: TypeCode) -> SyncResult<SyncValue> {
        if self.is_null() || target == TypeCode::Object || self.type_code() == Some(target) {
            return Ok(self.clone());
        }
        let fail = || SyncError::conversion(self, target);

        let converted = match target {
            TypeCode::Bool => match self {
                SyncValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Some(true),
                    "false" | "0" => Some(false),
                    _ => None,
                },
                other => other.integral().map(|v| v != 0),
            }
            .map(SyncValue::Bool),
            TypeCode::Byte => self.integral_in(u8::try_from).map(SyncValue::Byte),
            TypeCode::SByte => self.integral_in(i8::try_from).map(SyncValue::SByte),
            TypeCode::Int16 => self.integral_in(i16::try_from).map(SyncValue::Int16),
            TypeCode::Int32 => self.integral_in(i32::try_from).map(SyncValue::Int32),
            TypeCode::Int64 => self.integral_in(i64::try_from).map(SyncValue::Int64),
            TypeCode::UInt16 => self.integral_in(u16::try_from).map(SyncValue::UInt16),
            TypeCode::UInt32 => self.integral_in(u32::try_from).map(SyncValue::UInt32),
            TypeCode::UInt64 => self.integral_in(u64::try_from).map(SyncValue::UInt64),
            TypeCode::Double => self.floating().map(SyncValue::Double),
            TypeCode::Float => self
                .floating()
                .filter(|v| v.is_nan() || v.abs() <= f64::from(f32::MAX))
                .map(|v| SyncValue::Float(v as f32)),
            TypeCode::Decimal => match self {
                SyncValue::String(s) => s.trim().parse::<Decimal>().ok(),
                SyncValue::Float(v) => Decimal::from_f64(f64::from(*v)).ok(),
                SyncValue::Double(v) => Decimal::from_f64(*v).ok(),
                SyncValue::Bool(b) => Some(Decimal::from(i64::from(*b))),
                other => other
                    .integral()
                    .and_then(|v| Decimal::new(v, 0).ok()),
            }
            .map(SyncValue::Decimal),
            TypeCode::Char => match self {
                SyncValue::String(s) => single_char(s.chars()),
                SyncValue::Chars(c) => single_char(c.iter().copied()),
                other => other
                    .integral()
                    .and_then(|v| u32::try_from(v).ok())
                    .and_then(char::from_u32),
            }
            .map(SyncValue::Char),
            TypeCode::Chars => match self {
                SyncValue::Char(c) => Some(vec![*c]),
                other => Some(other.to_string_value().chars().collect()),
            }
            .map(SyncValue::Chars),
            TypeCode::String => Some(SyncValue::String(self.to_string_value())),
            TypeCode::Guid => match self {
                SyncValue::String(s) => Uuid::parse_str(s.trim()).ok(),
                SyncValue::Bytes(b) => Uuid::from_slice(b).ok(),
                _ => None,
            }
            .map(SyncValue::Guid),
            TypeCode::DateTime => match self {
                SyncValue::String(s) => parse_date_time(s.trim())
                    .or_else(|_| parse_date_time_offset(s.trim()).map(|dt| dt.naive_local()))
                    .ok(),
                SyncValue::DateTimeOffset(dt) => Some(dt.naive_local()),
                _ => None,
            }
            .map(SyncValue::DateTime),
            TypeCode::DateTimeOffset => match self {
                SyncValue::String(s) => parse_date_time_offset(s.trim())
                    .or_else(|_| parse_date_time(s.trim()).map(|dt| dt.and_utc().fixed_offset()))
                    .ok(),
                SyncValue::DateTime(dt) => Some(dt.and_utc().fixed_offset()),
                _ => None,
            }
            .map(SyncValue::DateTimeOffset),
            TypeCode::TimeSpan => match self {
                SyncValue::String(s) => parse_time_span(s.trim()).ok(),
                other => other
                    .integral()
                    .and_then(|ticks| i64::try_from(ticks).ok())
                    .and_then(|ticks| ticks.checked_mul(100))
                    .map(TimeDelta::nanoseconds),
            }
            .map(SyncValue::TimeSpan),
            TypeCode::Bytes => match self {
                SyncValue::String(s) => decode_base64(s).ok(),
                SyncValue::Guid(g) => Some(g.as_bytes().to_vec()),
                _ => None,
            }
            .map(SyncValue::Bytes),
            TypeCode::Object => Some(self.clone()),
        };

        converted.ok_or_else(fail)
    }

    /// Text form used when converting to a string column.
    fn to_string_value(&self) -> String {
        match self {
            SyncValue::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }

    /// Integer view of the value if it holds an exact integral quantity.
    fn integral(&self) -> Option<i128> {
        match self {
            SyncValue::Bool(b) => Some(i128::from(*b)),
            SyncValue::UInt64(v) => Some(i128::from(*v)),
            SyncValue::Float(v) => float_to_i128(f64::from(*v)),
            SyncValue::Double(v) => float_to_i128(*v),
            SyncValue::Decimal(v) => v.to_i128(),
            SyncValue::String(s) => s.trim().parse::<i128>().ok(),
            other => other.as_i64().map(i128::from),
        }
    }

    fn integral_in<T, E>(&self, narrow: impl Fn(i128) -> Result<T, E>) -> Option<T> {
        self.integral().and_then(|v| narrow(v).ok())
    }

    fn floating(&self) -> Option<f64> {
        match self {
            SyncValue::String(s) => s.trim().parse::<f64>().ok(),
            SyncValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.as_f64(),
        }
    }
}

fn float_to_i128(value: f64) -> Option<i128> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1.7e38 {
        Some(value as i128)
    } else {
        None
    }
}

fn single_char(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}
