//! ZigZag JUnit Parsing
//!
//! Turns JUnit XML reports into the ZigZag test log model.
//! It includes:
//! - A quick-xml reader producing a raw element tree
//! - The built-in JUnit schema and its validator
//! - Conversion of a validated tree into a [`TestLog`]

pub mod parser;
pub mod raw;
pub mod schema;

pub use parser::{parse_test_log, parse_test_log_with_schema};
pub use raw::{RawElement, read_document};
pub use schema::{JUNIT_SCHEMA, Schema};

pub use zigzag_core::ParsingError;
pub use zigzag_core::domain::log::TestLog;
