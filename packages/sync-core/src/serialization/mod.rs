//! Batch file serialization: streaming row files, multi-part batches and
//! the nested-array codec.

mod array_converter;
mod batch;
mod local_json;

pub use array_converter::ArrayJsonConverter;
pub use batch::{BatchInfo, BatchPartInfo, BatchRows, BatchWriter, BATCH_INFO_FILE};
pub use local_json::{BatchRowReader, LocalJsonSerializer};
