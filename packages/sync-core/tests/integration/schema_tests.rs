//! Schema set integration tests.
//!
//! Tests:
//! 3.1: Schema file survives save/load with relations and filters
//! 3.2: Name comparison rule decides lookups after load
//! 3.3: Schema copy drives a batch round trip of the original rows
//! 3.4: Broken cross references are rejected on load

use ntest::timeout;
use std::fs;
use tempfile::tempdir;

use sync_core::schema::{NameComparison, SyncFilter, SyncFilterParameter, SyncSet};
use sync_core::table::RowState;
use sync_core::types::{DbType, SyncValue};
use sync_core::{LocalJsonSerializer, SyncError};

use super::helpers::{customer_row, shop_set};

/// Test 3.1
#[timeout(5000)]
#[test]
fn test_schema_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scope").join("schema.json");

    let mut set = shop_set();
    let mut filter = SyncFilter::new("Customer", "dbo");
    let mut parameter = SyncFilterParameter::new("CustomerId", "Customer");
    parameter.db_type = Some(DbType::Int32);
    filter
        .add_parameter(parameter)
        .add_where("Id", "Customer", "CustomerId");
    set.filters.push(filter);
    set.ensure_schema().unwrap();

    set.save_schema(&path).unwrap();
    assert!(!dir.path().join("scope").join("schema.json.tmp").exists());

    let loaded = SyncSet::load_schema(&path).unwrap();
    assert!(loaded.equals_by_properties(&set, NameComparison::Ordinal));
    assert_eq!(loaded.filters[0].parameters[0].db_type, Some(DbType::Int32));

    let orders = loaded.table("Order", "dbo").unwrap();
    assert_eq!(loaded.relations_for_child(orders).count(), 1);
    assert_eq!(orders.columns.get("Placed").unwrap().ordinal(), 3);

    // Rows never travel with the schema.
    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains("rows"));
}

/// Test 3.2
#[timeout(5000)]
#[test]
fn test_comparison_rule_after_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schema.json");
    shop_set().save_schema(&path).unwrap();

    let relaxed = SyncSet::load_schema(&path).unwrap();
    assert!(relaxed.table("CUSTOMER", "DBO").is_some());
    let customers = relaxed.table("customer", "dbo").unwrap();
    assert!(customers.columns.contains("name"));

    let strict = SyncSet::load_schema_with(&path, NameComparison::Ordinal).unwrap();
    assert!(strict.table("CUSTOMER", "dbo").is_none());
    let customers = strict.table("Customer", "dbo").unwrap();
    let row = customer_row(customers, RowState::Added, 1, "Alice");
    assert!(matches!(
        row.get_by_name(customers, "name"),
        Err(SyncError::ColumnNotFound { .. })
    ));
    assert_eq!(row.get_by_name(customers, "Name").unwrap(), &SyncValue::from("Alice"));
}

/// Test 3.3
#[timeout(5000)]
#[test]
fn test_schema_copy_reads_batch() {
    let dir = tempdir().unwrap();
    let mut source = shop_set();
    {
        let customers = source.table_mut("Customer", "dbo").unwrap();
        for (id, name) in [(1, "Alice"), (2, "Bob")] {
            let row = customer_row(customers, RowState::Added, id, name);
            customers.add_row(row).unwrap();
        }
    }

    let customers = source.table("Customer", "dbo").unwrap();
    let path = dir.path().join("customers.json");
    let mut serializer = LocalJsonSerializer::new();
    serializer.open_file(&path, customers).unwrap();
    for row in customers.rows.iter() {
        serializer.write_row(row, customers).unwrap();
    }
    serializer.close_file().unwrap();

    let mut target = source.clone_schema(true);
    assert!(target.has_columns());
    let target_customers = target.table_mut("Customer", "dbo").unwrap();
    assert!(target_customers.rows.is_empty());
    let schema = target_customers.clone_schema();
    for row in serializer.read_rows_from_file(&path, &schema).unwrap() {
        target_customers.add_row(row.unwrap()).unwrap();
    }

    assert_eq!(target_customers.rows.len(), 2);
    let bob = target_customers
        .find_by_primary_key(&[SyncValue::Int64(2)])
        .unwrap()
        .unwrap();
    assert_eq!(bob[1], SyncValue::from("Bob"));
}

/// Test 3.4
#[timeout(5000)]
#[test]
fn test_dangling_references_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schema.json");
    let mut set = shop_set();
    set.relations[0].keys[0].column_name = "ClientId".to_string();
    set.save_schema(&path).unwrap();

    assert!(matches!(
        SyncSet::load_schema(&path),
        Err(SyncError::ColumnNotFound { .. })
    ));

    let mut set = shop_set();
    set.filters.push(SyncFilter::new("Invoice", "dbo"));
    set.save_schema(&path).unwrap();
    assert!(matches!(
        SyncSet::load_schema(&path),
        Err(SyncError::TableNotFound { .. })
    ));
}
