//! Integration test suite.
//!
//! 1. Batch file serialization: round trips, crash recovery, rotation
//! 2. Tokenizer: chunked and throttled input, buffer ceiling
//! 3. Schema sets: persistence, ensure, comparison rules

pub mod helpers;
pub mod schema_tests;
pub mod serializer_tests;
pub mod tokenizer_tests;
