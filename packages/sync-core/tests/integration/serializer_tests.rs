//! Batch file serialization tests.
//!
//! Tests:
//! 1.1: Customer row survives a write/read cycle with state and name lookup
//! 1.2: Typed cells of many kinds round trip through one file
//! 1.3: Interrupted writer leaves a file readable up to the last row
//! 1.4: Batch writer rotates parts and verifies checksums on read
//! 1.5: Rows read back merge into a table for primary key lookup
//! 1.6: One column of every fixed type round trips with edge values

use chrono::{DateTime, NaiveDate, TimeDelta};
use ntest::timeout;
use std::fs;
use uuid::Uuid;
use tempfile::tempdir;

use sync_core::config::SyncConfig;
use sync_core::serialization::{BatchInfo, BatchWriter, LocalJsonSerializer};
use sync_core::table::{RowState, SyncColumn, SyncRow, SyncTable};
use sync_core::types::{SyncValue, TypeCode};
use sync_core::SyncError;

use super::helpers::{cells, customer_row, customer_table, order_table};

/// Test 1.1: the Customer scenario
#[timeout(5000)]
#[test]
fn test_customer_row_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("customer.json");
    let table = customer_table();

    let row = customer_row(&table, RowState::Added, 1, "Alice");
    assert_eq!(
        row.to_array(),
        vec![SyncValue::Int32(1), SyncValue::Int32(1), SyncValue::from("Alice")]
    );

    let mut serializer = LocalJsonSerializer::new();
    serializer.open_file(&path, &table).unwrap();
    serializer.write_row(&row, &table).unwrap();
    serializer.close_file().unwrap();

    let rows: Vec<SyncRow> = serializer
        .read_rows_from_file(&path, &table)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].state(), RowState::Added);
    assert_eq!(
        rows[0].get_by_name(&table, "Name").unwrap(),
        &SyncValue::from("Alice")
    );
    assert_eq!(cells(&rows[0]), cells(&row));
}

/// Test 1.2: every wire form used by an order row
#[timeout(5000)]
#[test]
fn test_typed_cells_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("order.json");
    let table = order_table();

    let mut rows = Vec::new();
    for (i, state) in [RowState::Added, RowState::Modified, RowState::Deleted]
        .into_iter()
        .enumerate()
    {
        let mut row = table.new_row(state);
        row[0] = SyncValue::Int32(i as i32 + 100);
        row[1] = SyncValue::Int32(1);
        row[2] = SyncValue::from("19.990")
            .convert_to(TypeCode::Decimal)
            .unwrap();
        row[3] = SyncValue::from("2024-05-01T10:00:00.25+02:00")
            .convert_to(TypeCode::DateTimeOffset)
            .unwrap();
        rows.push(row);
    }
    rows[2][3] = SyncValue::Null;

    let mut serializer = LocalJsonSerializer::new();
    serializer.open_file(&path, &table).unwrap();
    for row in &rows {
        serializer.write_row(row, &table).unwrap();
    }
    serializer.close_file().unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n[1,100,1,19.990,\"2024-05-01T10:00:00.250+02:00\"]"));

    let read: Vec<SyncRow> = serializer
        .read_rows_from_file(&path, &table)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(read.len(), 3);
    for (written, read) in rows.iter().zip(&read) {
        assert_eq!(written.state(), read.state());
        assert_eq!(cells(written), cells(read));
    }
}

/// Test 1.3: the file ends mid-row, as after a crash between flushes
#[timeout(5000)]
#[test]
fn test_interrupted_writer_recovery() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("customer.json");
    let table = customer_table();

    let mut serializer = LocalJsonSerializer::new();
    serializer.open_file(&path, &table).unwrap();
    for id in 1..=3 {
        let row = customer_row(&table, RowState::Modified, id, &format!("c{}", id));
        serializer.write_row(&row, &table).unwrap();
    }
    // Each row is flushed, so the file already holds three complete rows.
    let size = serializer.current_file_size();
    assert_eq!(fs::metadata(&path).unwrap().len(), size);

    let mut partial = fs::read(&path).unwrap();
    partial.extend_from_slice(b",\n[2,4,\"c");
    let copy = dir.path().join("crashed.json");
    fs::write(&copy, &partial).unwrap();
    serializer.close_file().unwrap();

    let rows: Vec<SyncRow> = serializer
        .read_rows_from_file(&copy, &table)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2][1], SyncValue::from("c3"));
}

/// Test 1.4: rotation, manifest and checksum verification
#[timeout(10000)]
#[test]
fn test_batch_rotation_and_checksums() {
    let dir = tempdir().unwrap();
    let config = SyncConfig {
        batch_directory: dir.path().to_path_buf(),
        batch_size_bytes: 256,
        ..Default::default()
    };
    let customers = customer_table();
    let orders = order_table();

    let mut writer = BatchWriter::new(&config);
    for id in 0..50 {
        let row = customer_row(&customers, RowState::Added, id, "a fairly long customer name");
        writer.write_row(&customers, &row).unwrap();
    }
    let mut order = orders.new_row(RowState::Added);
    order[0] = SyncValue::Int32(1);
    order[1] = SyncValue::Int32(0);
    writer.write_row(&orders, &order).unwrap();
    let directory = writer.directory().to_path_buf();
    let info = writer.finish().unwrap();

    assert!(info.parts.len() > 2);
    assert_eq!(info.rows_count(), 51);
    assert_eq!(info.parts_for(&orders).count(), 1);
    for (index, part) in info.parts.iter().enumerate() {
        assert_eq!(part.index, index);
        assert!(part.crc32.is_some());
    }

    let loaded = BatchInfo::load(&directory).unwrap();
    let ids: Vec<SyncValue> = loaded
        .read_rows(&customers)
        .map(|row| row.unwrap()[0].clone())
        .collect();
    assert_eq!(ids, (0..50).map(SyncValue::Int32).collect::<Vec<_>>());

    // Corrupt the second customer part; rows of the first part still arrive.
    let victim = loaded.parts_for(&customers).nth(1).unwrap();
    let victim_path = directory.join(&victim.file_name);
    let mut bytes = fs::read(&victim_path).unwrap();
    let last = bytes.len() - 10;
    bytes[last] = b'X';
    fs::write(&victim_path, bytes).unwrap();

    let first_part_rows = loaded.parts[0].rows_count as usize;
    let results: Vec<_> = loaded.read_rows(&customers).collect();
    assert_eq!(results.len(), first_part_rows + 1);
    assert!(matches!(
        results.last(),
        Some(Err(SyncError::ChecksumMismatch { .. }))
    ));
}

/// Test 1.5: rows read back are merged and found by key
#[timeout(5000)]
#[test]
fn test_merge_read_rows_into_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("customer.json");
    let mut table = customer_table();

    let mut serializer = LocalJsonSerializer::new();
    serializer.open_file(&path, &table).unwrap();
    for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Carol")] {
        serializer
            .write_row(&customer_row(&table, RowState::Added, id, name), &table)
            .unwrap();
    }
    serializer.close_file().unwrap();

    let schema = table.clone_schema();
    for row in serializer.read_rows_from_file(&path, &schema).unwrap() {
        table.add_row(row.unwrap()).unwrap();
    }

    let found = table
        .find_by_primary_key(&[SyncValue::from("2")])
        .unwrap()
        .unwrap();
    assert_eq!(found.get_by_name(&table, "name").unwrap(), &SyncValue::from("Bob"));
    assert!(table.find_by_primary_key(&[SyncValue::Int32(9)]).unwrap().is_none());
}

/// Edge value for a column of type `code`.
fn edge_value(code: TypeCode) -> SyncValue {
    match code {
        TypeCode::Bool => SyncValue::Bool(true),
        TypeCode::Byte => SyncValue::Byte(u8::MAX),
        TypeCode::SByte => SyncValue::SByte(i8::MIN),
        TypeCode::Char => SyncValue::Char('\0'),
        TypeCode::Int16 => SyncValue::Int16(i16::MIN),
        TypeCode::Int32 => SyncValue::Int32(i32::MIN),
        TypeCode::Int64 => SyncValue::Int64(i64::MIN),
        TypeCode::UInt16 => SyncValue::UInt16(u16::MAX),
        TypeCode::UInt32 => SyncValue::UInt32(u32::MAX),
        TypeCode::UInt64 => SyncValue::UInt64(u64::MAX),
        TypeCode::Float => SyncValue::Float(f32::MAX),
        TypeCode::Double => SyncValue::Double(-1.0e-300),
        TypeCode::Decimal => SyncValue::from("-12.3400")
            .convert_to(TypeCode::Decimal)
            .unwrap(),
        TypeCode::DateTime => SyncValue::DateTime(
            NaiveDate::from_ymd_opt(2024, 2, 29)
                .unwrap()
                .and_hms_nano_opt(23, 59, 59, 123_456_700)
                .unwrap(),
        ),
        TypeCode::DateTimeOffset => SyncValue::DateTimeOffset(
            DateTime::parse_from_rfc3339("1999-12-31T23:59:59.5-05:30").unwrap(),
        ),
        TypeCode::TimeSpan => SyncValue::TimeSpan(TimeDelta::milliseconds(-93_784_500)),
        TypeCode::Guid => SyncValue::Guid(Uuid::from_u128(0x0123_4567_89ab_cdef_fedc_ba98_7654_3210)),
        TypeCode::String => SyncValue::from("line\n\"quoted\" \u{1F600}"),
        TypeCode::Bytes => SyncValue::Bytes(vec![0, 255, 16, 128]),
        TypeCode::Chars => SyncValue::Chars(vec!['a', '\0', '\u{1F600}']),
        other => panic!("no edge value for {:?}", other),
    }
}

/// Test 1.6: every fixed type code survives a write/read cycle
#[timeout(5000)]
#[test]
fn test_all_fixed_types_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("all_types.json");
    let mut table = SyncTable::new("AllTypes", "dbo");
    for code in TypeCode::FIXED {
        table
            .add_column(SyncColumn::new(format!("{:?}Column", code), code))
            .unwrap();
    }

    let mut filled = table.new_row(RowState::Modified);
    for (i, code) in TypeCode::FIXED.into_iter().enumerate() {
        filled[i] = edge_value(code);
    }
    let empty = table.new_row(RowState::Deleted);
    let written = [filled, empty];

    let mut serializer = LocalJsonSerializer::new();
    serializer.open_file(&path, &table).unwrap();
    for row in &written {
        serializer.write_row(row, &table).unwrap();
    }
    serializer.close_file().unwrap();

    let read: Vec<SyncRow> = serializer
        .read_rows_from_file(&path, &table)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(read.len(), 2);
    for (written, read) in written.iter().zip(&read) {
        assert_eq!(read.to_array(), written.to_array());
    }
}
