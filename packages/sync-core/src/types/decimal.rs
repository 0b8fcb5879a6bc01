//! Fixed-point decimal values.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::SyncError;

/// Largest scale a decimal may carry.
pub const MAX_SCALE: u32 = 28;

/// Decimal digits an `i128` mantissa can always hold.
const MAX_DIGITS: u32 = 38;

/// Exact base-10 fixed-point number: `mantissa * 10^-scale`.
///
/// Trailing zeros are kept for display, so `"1.50"` prints back as parsed.
/// Equality and hashing are numeric: `1.50 == 1.5`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    /// Creates a decimal from its parts.
    pub fn new(mantissa: i128, scale: u32) -> Result<Self, SyncError> {
        if scale > MAX_SCALE {
            return Err(SyncError::format("decimal", format!("{}e-{}", mantissa, scale)));
        }
        Ok(Self { mantissa, scale })
    }

    /// Returns the unscaled integer value.
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    /// Returns the number of fractional digits.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Strips trailing fractional zeros.
    pub fn normalize(&self) -> Self {
        let mut mantissa = self.mantissa;
        let mut scale = self.scale;
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Self { mantissa, scale }
    }

    /// Converts to the nearest `f64`.
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    /// Returns the integral value if the decimal has no fractional part.
    pub fn to_i128(&self) -> Option<i128> {
        let normalized = self.normalize();
        (normalized.scale == 0).then_some(normalized.mantissa)
    }

    /// Converts a finite `f64` using its shortest round-trip representation.
    pub fn from_f64(value: f64) -> Result<Self, SyncError> {
        if !value.is_finite() {
            return Err(SyncError::conversion(value, "decimal"));
        }
        format!("{:?}", value).parse()
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.normalize(), other.normalize());
        a.mantissa == b.mantissa && a.scale == b.scale
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let normalized = self.normalize();
        normalized.mantissa.hash(state);
        normalized.scale.hash(state);
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self {
            mantissa: i128::from(value),
            scale: 0,
        }
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self {
            mantissa: i128::from(value),
            scale: 0,
        }
    }
}

impl FromStr for Decimal {
    type Err = SyncError;

    /// Parses `[-+]digits[.digits][(e|E)[-+]digits]`. The whole input must be consumed.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let err = || SyncError::format("decimal", text);
        let bytes = text.as_bytes();
        let mut pos = 0;
        let negative = match bytes.first() {
            Some(b'-') => {
                pos += 1;
                true
            }
            Some(b'+') => {
                pos += 1;
                false
            }
            _ => false,
        };

        let mut mantissa: i128 = 0;
        let mut digits = 0usize;
        let mut scale: i64 = 0;
        let mut seen_point = false;
        while pos < bytes.len() {
            match bytes[pos] {
                b @ b'0'..=b'9' => {
                    mantissa = mantissa
                        .checked_mul(10)
                        .and_then(|m| m.checked_add(i128::from(b - b'0')))
                        .ok_or_else(err)?;
                    digits += 1;
                    if seen_point {
                        scale += 1;
                    }
                }
                b'.' if !seen_point => seen_point = true,
                _ => break,
            }
            pos += 1;
        }
        if digits == 0 {
            return Err(err());
        }

        if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
            let exponent: i64 = text[pos + 1..].parse().map_err(|_| err())?;
            scale = scale.checked_sub(exponent).ok_or_else(err)?;
            pos = bytes.len();
        }
        if pos != bytes.len() {
            return Err(err());
        }

        if mantissa == 0 {
            return Ok(Self {
                mantissa: 0,
                scale: scale.clamp(0, i64::from(MAX_SCALE)) as u32,
            });
        }
        if scale < -i64::from(MAX_DIGITS) {
            return Err(err());
        }
        while scale < 0 {
            mantissa = mantissa.checked_mul(10).ok_or_else(err)?;
            scale += 1;
        }
        if scale > i64::from(MAX_SCALE) {
            return Err(err());
        }

        Ok(Self {
            mantissa: if negative { -mantissa } else { mantissa },
            scale: scale as u32,
        })
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.unsigned_abs().to_string();
        let sign = if self.mantissa < 0 { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int, frac)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::timeout;

    #[timeout(1000)]
    #[test]
    fn test_parse_and_display() {
        for text in ["0", "-1", "123.4500", "0.001", "-0.5", "79228162514264337593543950335"] {
            let value: Decimal = text.parse().unwrap();
            assert_eq!(value.to_string(), text);
        }
    }

    #[timeout(1000)]
    #[test]
    fn test_exponent() {
        let value: Decimal = "1.5E+3".parse().unwrap();
        assert_eq!(value.to_string(), "1500");
        let value: Decimal = "25e-3".parse().unwrap();
        assert_eq!(value.to_string(), "0.025");
    }

    #[timeout(1000)]
    #[test]
    fn test_rejects_trailing_garbage() {
        assert!("12.5x".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
        assert!("-".parse::<Decimal>().is_err());
        assert!("1.2.3".parse::<Decimal>().is_err());
    }

    #[timeout(1000)]
    #[test]
    fn test_extreme_exponents() {
        assert!("1e-9223372036854775808".parse::<Decimal>().is_err());
        assert!("1e9223372036854775807".parse::<Decimal>().is_err());
        assert!("1e39".parse::<Decimal>().is_err());

        let zero: Decimal = "0e9223372036854775807".parse().unwrap();
        assert_eq!(zero.to_string(), "0");
        let zero: Decimal = "0.00".parse().unwrap();
        assert_eq!(zero.to_string(), "0.00");
        assert_eq!("1e38".parse::<Decimal>().unwrap().to_i128(), Some(10i128.pow(38)));
    }

    #[timeout(1000)]
    #[test]
    fn test_numeric_equality() {
        use std::collections::HashSet;

        let a: Decimal = "1.50".parse().unwrap();
        let b: Decimal = "1.5".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "1.50");
        assert_ne!(a, "1.05".parse::<Decimal>().unwrap());

        let set: HashSet<Decimal> = [a, b, "15e-1".parse().unwrap()].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[timeout(1000)]
    #[test]
    fn test_normalize() {
        let value: Decimal = "2.500".parse().unwrap();
        assert_eq!(value.normalize().to_string(), "2.5");
        assert_eq!("5.00".parse::<Decimal>().unwrap().to_i128(), Some(5));
        assert_eq!(Decimal::from_f64(0.25).unwrap().to_string(), "0.25");
    }
}
