//! Tokenizer integration tests.
//!
//! Tests:
//! 2.1: Token stream is independent of buffer size and read chunking
//! 2.2: Typed accessors agree with serde_json on generated documents
//! 2.3: Batch files decode through a one-byte source
//! 2.4: A single oversized token hits the buffer ceiling

use ntest::timeout;
use proptest::prelude::*;
use std::io::Read;

use sync_core::json::{JsonReader, JsonTokenType};
use sync_core::{SyncError, SyncResult};

/// Source that hands out at most `chunk` bytes per read.
struct Throttled<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl Read for Throttled<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

type Token = (JsonTokenType, usize, String);

fn collect_tokens<R: Read>(mut reader: JsonReader<R>) -> SyncResult<(Vec<Token>, bool)> {
    let mut tokens = Vec::new();
    while reader.read()? {
        let text = match reader.token_type() {
            JsonTokenType::String | JsonTokenType::PropertyName => reader.get_string()?,
            _ => String::from_utf8_lossy(reader.value_span()).into_owned(),
        };
        tokens.push((reader.token_type(), reader.depth(), text));
    }
    Ok((tokens, reader.is_complete()))
}

fn json_strategy() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i64>().prop_map(serde_json::Value::from),
        (-1.0e9f64..1.0e9).prop_map(serde_json::Value::from),
        "\\PC{0,12}".prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..5)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Scalars of a parsed document in document order, as the reader sees them.
fn scalars(value: &serde_json::Value, out: &mut Vec<serde_json::Value>) {
    match value {
        serde_json::Value::Array(items) => items.iter().for_each(|v| scalars(v, out)),
        serde_json::Value::Object(map) => map.values().for_each(|v| scalars(v, out)),
        other => out.push(other.clone()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Test 2.1
    #[test]
    fn test_chunking_does_not_change_tokens(
        value in json_strategy(),
        pretty in any::<bool>(),
        buffer_size in 1usize..32,
        chunk in 1usize..17,
    ) {
        let text = if pretty {
            serde_json::to_string_pretty(&value).unwrap()
        } else {
            serde_json::to_string(&value).unwrap()
        };
        let bytes = text.as_bytes();

        let expected = collect_tokens(JsonReader::new(bytes)).unwrap();
        let source = Throttled { data: bytes, chunk };
        let actual = collect_tokens(JsonReader::with_buffer_size(source, buffer_size, 1 << 20)).unwrap();

        prop_assert_eq!(&actual, &expected);
        prop_assert!(expected.1);
    }

    /// Test 2.2
    #[test]
    fn test_scalars_match_serde(value in json_strategy()) {
        let text = serde_json::to_string(&value).unwrap();
        let mut expected = Vec::new();
        scalars(&value, &mut expected);

        let mut reader = JsonReader::with_buffer_size(text.as_bytes(), 4, 1 << 20);
        let mut actual = Vec::new();
        while reader.read().unwrap() {
            let scalar = match reader.token_type() {
                JsonTokenType::Null => serde_json::Value::Null,
                JsonTokenType::True | JsonTokenType::False => {
                    serde_json::Value::Bool(reader.get_bool().unwrap())
                }
                JsonTokenType::String => serde_json::Value::String(reader.get_string().unwrap()),
                JsonTokenType::Number => match reader.try_get_i64() {
                    Some(v) => serde_json::Value::from(v),
                    None => serde_json::Value::from(reader.get_f64().unwrap()),
                },
                _ => continue,
            };
            actual.push(scalar);
        }
        prop_assert_eq!(actual, expected);
    }
}

/// Test 2.3
#[timeout(5000)]
#[test]
fn test_batch_file_through_one_byte_source() {
    let text = "{\"t\":[{\"n\":\"Customer\",\"s\":\"dbo\",\"r\":[\n[1,1,\"Al\\u00efce\"],\n[3,2,null]\n]}]}";
    let source = Throttled {
        data: text.as_bytes(),
        chunk: 1,
    };
    let mut reader = JsonReader::with_buffer_size(source, 2, 64);

    let mut rows = 0;
    let mut names = Vec::new();
    while reader.read().unwrap() {
        match (reader.token_type(), reader.depth()) {
            (JsonTokenType::StartArray, 4) => rows += 1,
            (JsonTokenType::String, 5) => names.push(reader.get_string().unwrap()),
            _ => {}
        }
    }
    assert_eq!(rows, 2);
    assert_eq!(names, vec!["Al\u{ef}ce".to_string()]);
    assert!(reader.is_complete());
}

/// Test 2.4
#[timeout(5000)]
#[test]
fn test_oversized_token() {
    let text = format!("[1, \"{}\"]", "y".repeat(5000));
    let mut reader = JsonReader::with_buffer_size(text.as_bytes(), 64, 1024);
    assert!(reader.read().unwrap());
    assert!(reader.read().unwrap());
    assert_eq!(reader.get_i64().unwrap(), 1);

    let err = reader.read().unwrap_err();
    assert!(matches!(err, SyncError::BufferLimitExceeded { limit: 1024, .. }));
    assert!(!reader.read().unwrap());
}
