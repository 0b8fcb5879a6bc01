//! Streaming JSON: resumable tokenizer, reader and writer.

mod escape;
mod reader;
mod token;
mod tokenizer;
mod writer;

pub use reader::{JsonReader, JsonValues};
pub use token::JsonTokenType;
pub use writer::JsonWriter;
