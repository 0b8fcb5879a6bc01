//! Nested-array codec for row tuples.
//!
//! `[[v0, v1, ...], [v0, v1, ...]]`: one inner array per row. Reading has no
//! schema, so cells come back as inferred scalars.

use std::fmt;

use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::{Error as _, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::types::inference::infer_json_value;
use crate::types::SyncValue;

/// Row tuples converted through `serde`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayJsonConverter(pub Vec<Vec<SyncValue>>);

impl ArrayJsonConverter {
    pub fn new(rows: Vec<Vec<SyncValue>>) -> Self {
        Self(rows)
    }

    pub fn into_inner(self) -> Vec<Vec<SyncValue>> {
        self.0
    }
}

/// Serialization view of one cell.
struct WireValue<'a>(&'a SyncValue);

impl Serialize for WireValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            SyncValue::Null => serializer.serialize_unit(),
            SyncValue::Bool(v) => serializer.serialize_bool(*v),
            SyncValue::Byte(v) => serializer.serialize_u8(*v),
            SyncValue::SByte(v) => serializer.serialize_i8(*v),
            SyncValue::Int16(v) => serializer.serialize_i16(*v),
            SyncValue::Int32(v) => serializer.serialize_i32(*v),
            SyncValue::Int64(v) => serializer.serialize_i64(*v),
            SyncValue::UInt16(v) => serializer.serialize_u16(*v),
            SyncValue::UInt32(v) => serializer.serialize_u32(*v),
            SyncValue::UInt64(v) => serializer.serialize_u64(*v),
            SyncValue::Float(v) if v.is_finite() => serializer.serialize_f32(*v),
            SyncValue::Double(v) if v.is_finite() => serializer.serialize_f64(*v),
            SyncValue::Float(_) | SyncValue::Double(_) => Err(S::Error::custom(format!(
                "{} has no JSON representation",
                self.0
            ))),
            // Kept as text so no precision is lost to a double.
            SyncValue::Decimal(d) => serializer.serialize_str(&d.to_string()),
            other => match other.to_wire_string() {
                Some(text) => serializer.serialize_str(&text),
                None => serializer.serialize_unit(),
            },
        }
    }
}

struct WireRow<'a>(&'a [SyncValue]);

impl Serialize for WireRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for value in self.0 {
            seq.serialize_element(&WireValue(value))?;
        }
        seq.end()
    }
}

impl Serialize for ArrayJsonConverter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for row in &self.0 {
            seq.serialize_element(&WireRow(row))?;
        }
        seq.end()
    }
}

/// One inferred cell.
struct InferredValue(SyncValue);

impl<'de> Deserialize<'de> for InferredValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(InferredValue(infer_json_value(&value)))
    }
}

struct RowsVisitor;

impl<'de> Visitor<'de> for RowsVisitor {
    type Value = Vec<Vec<SyncValue>>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of row arrays")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut rows = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(row) = seq.next_element::<Vec<InferredValue>>()? {
            rows.push(row.into_iter().map(|cell| cell.0).collect());
        }
        Ok(rows)
    }
}

impl<'de> Deserialize<'de> for ArrayJsonConverter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(RowsVisitor).map(ArrayJsonConverter)
    }
}
