//! Shared fixtures for the integration tests.

use sync_core::schema::{SyncColumnIdentifier, SyncRelation, SyncSet};
use sync_core::table::{RowState, SyncColumn, SyncRow, SyncTable};
use sync_core::types::{SyncValue, TypeCode};

/// `Customer(Id int pk, Name string)`.
pub fn customer_table() -> SyncTable {
    let mut table = SyncTable::new("Customer", "dbo");
    table.add_column(SyncColumn::new("Id", TypeCode::Int32)).unwrap();
    table.add_column(SyncColumn::new("Name", TypeCode::String)).unwrap();
    table.add_primary_key("Id").unwrap();
    table
}

/// `Order(OrderId int pk, CustomerId int, Amount decimal, Placed datetimeoffset)`.
pub fn order_table() -> SyncTable {
    let mut table = SyncTable::new("Order", "dbo");
    table.add_column(SyncColumn::new("OrderId", TypeCode::Int32)).unwrap();
    table.add_column(SyncColumn::new("CustomerId", TypeCode::Int32)).unwrap();
    table.add_column(SyncColumn::new("Amount", TypeCode::Decimal)).unwrap();
    table.add_column(SyncColumn::new("Placed", TypeCode::DateTimeOffset)).unwrap();
    table.add_primary_key("OrderId").unwrap();
    table
}

pub fn customer_row(table: &SyncTable, state: RowState, id: i32, name: &str) -> SyncRow {
    let mut row = table.new_row(state);
    row.set_by_name(table, "Id", id).unwrap();
    row.set_by_name(table, "Name", name).unwrap();
    row
}

/// Customer and Order tables linked by `Order.CustomerId -> Customer.Id`.
pub fn shop_set() -> SyncSet {
    let mut set = SyncSet::new();
    set.add_table(customer_table()).unwrap();
    set.add_table(order_table()).unwrap();
    set.relations.push(SyncRelation::new(
        "FK_Order_Customer",
        vec![SyncColumnIdentifier::new("CustomerId", "Order", "dbo")],
        vec![SyncColumnIdentifier::new("Id", "Customer", "dbo")],
    ));
    set
}

/// Row values without the state slot.
pub fn cells(row: &SyncRow) -> Vec<SyncValue> {
    row.values().to_vec()
}
