//! Data Transfer Objects for the qTest API
//!
//! Request and response bodies exchanged with the remote test-management
//! service. They mirror the JSON the service expects and carry no behaviour.

pub mod link;
pub mod module;
pub mod result;
pub mod run;
