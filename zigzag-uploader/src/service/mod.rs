//! Service layer
//!
//! Synchronous planning logic that runs before any request is sent: module
//! path resolution and link extraction.

mod hierarchy;
mod requirements;

pub use hierarchy::ModuleHierarchy;
pub use requirements::{Extraction, LinkExtractor};
