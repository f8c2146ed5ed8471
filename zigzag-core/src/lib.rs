//! ZigZag Core
//!
//! Core types and abstractions for the ZigZag uploader.
//!
//! This crate contains:
//! - Domain types: the parsed test log, module tree, link requests and upload jobs
//! - DTOs: request and response bodies for the qTest API
//! - Errors: the error taxonomy shared by every ZigZag crate

pub mod domain;
pub mod dto;
pub mod error;
pub mod util;

pub use error::{ErrorKind, ParsingError, Result, ZigZagError};
