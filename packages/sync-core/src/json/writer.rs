//! Incremental JSON writer.

use std::io::Write;

use crate::error::{SyncError, SyncResult};
use crate::io_utils::classify_io_error;
use crate::types::SyncValue;

/// Writes JSON tokens one at a time, inserting separators.
///
/// Tracks the number of bytes written so callers can decide when to rotate
/// output files without querying the underlying stream.
pub struct JsonWriter<W: Write> {
    inner: W,
    /// One entry per open container: whether it already has an element
    stack: Vec<bool>,
    after_property: bool,
    line_break_depth: Option<usize>,
    bytes_written: u64,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            stack: Vec::new(),
            after_property: false,
            line_break_depth: None,
            bytes_written: 0,
        }
    }

    /// Starts every element of containers opened at `depth` on a new line.
    pub fn set_line_break_depth(&mut self, depth: usize) {
        self.line_break_depth = Some(depth);
    }

    /// Total bytes handed to the underlying writer.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Number of open containers.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn raw(&mut self, bytes: &[u8]) -> SyncResult<()> {
        self.inner
            .write_all(bytes)
            .map_err(|e| classify_io_error(e, "Failed to write JSON"))?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn breaks_lines(&self) -> bool {
        self.line_break_depth == Some(self.stack.len())
    }

    fn before_value(&mut self) -> SyncResult<()> {
        if self.after_property {
            self.after_property = false;
            return Ok(());
        }
        let Some(has_elements) = self.stack.last_mut() else {
            return Ok(());
        };
        let separator = std::mem::replace(has_elements, true);
        if separator {
            self.raw(b",")?;
        }
        if self.breaks_lines() {
            self.raw(b"\n")?;
        }
        Ok(())
    }

    fn end_container(&mut self, close: &[u8]) -> SyncResult<()> {
        if self.breaks_lines() && self.stack.last() == Some(&true) {
            self.raw(b"\n")?;
        }
        if self.stack.pop().is_none() {
            return Err(SyncError::SerializationError(
                "no open container to close".to_string(),
            ));
        }
        self.raw(close)
    }

    pub fn write_start_object(&mut self) -> SyncResult<()> {
        self.before_value()?;
        self.stack.push(false);
        self.raw(b"{")
    }

    pub fn write_end_object(&mut self) -> SyncResult<()> {
        self.end_container(b"}")
    }

    pub fn write_start_array(&mut self) -> SyncResult<()> {
        self.before_value()?;
        self.stack.push(false);
        self.raw(b"[")
    }

    pub fn write_end_array(&mut self) -> SyncResult<()> {
        self.end_container(b"]")
    }

    /// Writes a property name and the `:` that follows it.
    pub fn write_property_name(&mut self, name: &str) -> SyncResult<()> {
        self.before_value()?;
        self.write_quoted(name)?;
        self.raw(b":")?;
        self.after_property = true;
        Ok(())
    }

    fn write_quoted(&mut self, text: &str) -> SyncResult<()> {
        let quoted = serde_json::to_string(text)?;
        self.raw(quoted.as_bytes())
    }

    pub fn write_string(&mut self, text: &str) -> SyncResult<()> {
        self.before_value()?;
        self.write_quoted(text)
    }

    pub fn write_bool(&mut self, value: bool) -> SyncResult<()> {
        self.before_value()?;
        self.raw(if value { b"true" } else { b"false" })
    }

    pub fn write_null(&mut self) -> SyncResult<()> {
        self.before_value()?;
        self.raw(b"null")
    }

    /// Writes an already formatted number.
    fn write_number_text(&mut self, text: &str) -> SyncResult<()> {
        self.before_value()?;
        self.raw(text.as_bytes())
    }

    pub fn write_i64(&mut self, value: i64) -> SyncResult<()> {
        self.write_number_text(&value.to_string())
    }

    /// Writes a finite double; NaN and infinities have no JSON form.
    pub fn write_f64(&mut self, value: f64) -> SyncResult<()> {
        if !value.is_finite() {
            return Err(SyncError::conversion(value, "JSON number"));
        }
        self.write_number_text(&format!("{:?}", value))
    }

    /// Writes a cell value in its wire form.
    ///
    /// Numbers (decimals included) are written as JSON numbers; dates,
    /// guids, time spans, chars and blobs as strings.
    pub fn write_value(&mut self, value: &SyncValue) -> SyncResult<()> {
        match value {
            SyncValue::Null => self.write_null(),
            SyncValue::Bool(b) => self.write_bool(*b),
            SyncValue::Float(v) => {
                if !v.is_finite() {
                    return Err(SyncError::conversion(v, "JSON number"));
                }
                self.write_number_text(&format!("{:?}", v))
            }
            SyncValue::Double(v) => self.write_f64(*v),
            SyncValue::Decimal(d) => self.write_number_text(&d.to_string()),
            SyncValue::Byte(_)
            | SyncValue::SByte(_)
            | SyncValue::Int16(_)
            | SyncValue::Int32(_)
            | SyncValue::Int64(_)
            | SyncValue::UInt16(_)
            | SyncValue::UInt32(_)
            | SyncValue::UInt64(_) => self.write_number_text(&value.to_string()),
            other => match other.to_wire_string() {
                Some(text) => self.write_string(&text),
                None => self.write_null(),
            },
        }
    }

    pub fn flush(&mut self) -> SyncResult<()> {
        self.inner
            .flush()
            .map_err(|e| classify_io_error(e, "Failed to flush JSON"))
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Decimal;
    use ntest::timeout;

    fn written(build: impl FnOnce(&mut JsonWriter<Vec<u8>>) -> SyncResult<()>) -> String {
        let mut writer = JsonWriter::new(Vec::new());
        build(&mut writer).unwrap();
        assert_eq!(writer.bytes_written() as usize, writer.get_ref().len());
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[timeout(1000)]
    #[test]
    fn test_separators() {
        let json = written(|w| {
            w.write_start_object()?;
            w.write_property_name("a")?;
            w.write_start_array()?;
            w.write_i64(1)?;
            w.write_string("x\"y")?;
            w.write_null()?;
            w.write_end_array()?;
            w.write_property_name("b")?;
            w.write_bool(false)?;
            w.write_end_object()
        });
        assert_eq!(json, r#"{"a":[1,"x\"y",null],"b":false}"#);
    }

    #[timeout(1000)]
    #[test]
    fn test_line_breaks() {
        let json = written(|w| {
            w.set_line_break_depth(1);
            w.write_start_array()?;
            w.write_start_array()?;
            w.write_i64(1)?;
            w.write_end_array()?;
            w.write_start_array()?;
            w.write_i64(2)?;
            w.write_end_array()?;
            w.write_end_array()
        });
        assert_eq!(json, "[\n[1],\n[2]\n]");
    }

    #[timeout(1000)]
    #[test]
    fn test_value_forms() {
        let decimal: Decimal = "12.50".parse().unwrap();
        let json = written(|w| {
            w.write_start_array()?;
            w.write_value(&SyncValue::Decimal(decimal))?;
            w.write_value(&SyncValue::Double(0.1))?;
            w.write_value(&SyncValue::Double(2.0))?;
            w.write_value(&SyncValue::Bytes(vec![1, 2, 3]))?;
            w.write_value(&SyncValue::UInt64(u64::MAX))?;
            w.write_end_array()
        });
        assert_eq!(json, r#"[12.50,0.1,2.0,"AQID",18446744073709551615]"#);
    }

    #[timeout(1000)]
    #[test]
    fn test_non_finite_rejected() {
        let mut writer = JsonWriter::new(Vec::new());
        assert!(writer.write_f64(f64::NAN).is_err());
        assert!(writer.write_end_array().is_err());
    }
}
