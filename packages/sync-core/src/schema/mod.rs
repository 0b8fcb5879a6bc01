//! Schema set, relations, filters and the name comparison rule.

mod comparison;
mod filter;
mod persistence;
mod relation;
mod set;

pub use comparison::NameComparison;
pub use filter::{Join, SyncFilter, SyncFilterJoin, SyncFilterParameter, SyncFilterWhereSideItem};
pub use relation::{SyncColumnIdentifier, SyncRelation};
pub use set::SyncSet;
