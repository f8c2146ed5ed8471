//! Core domain types
//!
//! This module contains the structures shared by the parser, the planner and
//! the upload queue: the parsed test log, the module tree, link requests and
//! upload jobs.

pub mod job;
pub mod link;
pub mod log;
pub mod module;
