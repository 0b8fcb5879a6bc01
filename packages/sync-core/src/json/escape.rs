//! String unescaping for token spans.

use crate::error::{SyncError, SyncResult};

/// Decodes the bytes between the quotes of a validated string token.
///
/// # Arguments
/// * `raw` - Token bytes, already checked for UTF-8 and escape syntax
/// * `position` - Absolute offset of `raw`, used in errors
pub(crate) fn unescape(raw: &[u8], position: usize) -> SyncResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let run_end = raw[i..]
            .iter()
            .position(|&b| b == b'\\')
            .map_or(raw.len(), |p| i + p);
        if run_end > i {
            let run = std::str::from_utf8(&raw[i..run_end]).map_err(|e| SyncError::InvalidUtf8 {
                position: position + i + e.valid_up_to(),
            })?;
            out.push_str(run);
            i = run_end;
            continue;
        }

        let escape = raw.get(i + 1).copied().ok_or(SyncError::UnexpectedEndOfJson)?;
        match escape {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{0008}'),
            b'f' => out.push('\u{000C}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let high = hex4(raw, i + 2, position)?;
                let (c, width) = if (0xD800..0xDC00).contains(&high) {
                    let low = match raw.get(i + 6..i + 8) {
                        Some(b"\\u") => hex4(raw, i + 8, position)?,
                        _ => return Err(surrogate_error(position + i)),
                    };
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(surrogate_error(position + i));
                    }
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    (char::from_u32(code), 12)
                } else {
                    (char::from_u32(high), 6)
                };
                out.push(c.ok_or_else(|| surrogate_error(position + i))?);
                i += width;
                continue;
            }
            _ => {
                return Err(SyncError::invalid_json(position + i, "invalid escape sequence"));
            }
        }
        i += 2;
    }

    Ok(out)
}

fn hex4(raw: &[u8], at: usize, position: usize) -> SyncResult<u32> {
    raw.get(at..at + 4)
        .and_then(|digits| std::str::from_utf8(digits).ok())
        .and_then(|digits| u32::from_str_radix(digits, 16).ok())
        .ok_or_else(|| SyncError::invalid_json(position + at, "invalid unicode escape"))
}

fn surrogate_error(position: usize) -> SyncError {
    SyncError::invalid_json(position, "unpaired surrogate in unicode escape")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::timeout;

    #[timeout(1000)]
    #[test]
    fn test_simple_escapes() {
        assert_eq!(unescape(br#"a\"b\\c\/d\n\t"#, 0).unwrap(), "a\"b\\c/d\n\t");
        assert_eq!(unescape(b"plain", 0).unwrap(), "plain");
    }

    #[timeout(1000)]
    #[test]
    fn test_unicode_escapes() {
        assert_eq!(unescape(br#"caf\u00e9"#, 0).unwrap(), "caf\u{e9}");
        assert_eq!(unescape(br#"\ud83d\ude00!"#, 0).unwrap(), "\u{1F600}!");
    }

    #[timeout(1000)]
    #[test]
    fn test_lone_surrogate() {
        assert!(matches!(
            unescape(br#"x\ud83d"#, 10),
            Err(SyncError::InvalidJson { position: 11, .. })
        ));
        assert!(unescape(br#"\ude00"#, 0).is_err());
    }
}
