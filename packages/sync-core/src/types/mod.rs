//! Value domain: type codes, database types, dynamic values, conversion and inference.

mod convert;
mod db_type;
mod decimal;
pub mod inference;
mod type_code;
mod value;

pub use db_type::DbType;
pub use decimal::{Decimal, MAX_SCALE};
pub use type_code::TypeCode;
pub use value::{
    decode_base64, format_date_time, format_time_span, parse_date_time, parse_date_time_offset,
    parse_time_span, SyncValue,
};
