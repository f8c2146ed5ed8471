//! ZigZag Uploader
//!
//! Publishes a parsed JUnit report to qTest Manager.
//!
//! Architecture:
//! - Configuration: TOML file, environment overrides, validated settings
//! - Git: branch, commit and repository of the uploaded run
//! - Services: module path resolution and link extraction (synchronous)
//! - Scheduler: the upload queue with bounded dispatch and retries
//! - Orchestrator: plans the job graph, runs the queue, summarizes
//!
//! The remote API is reached only through [`zigzag_client::QTestApi`], so the
//! whole pipeline runs against an in-memory implementation in tests.

pub mod config;
pub mod git;
pub mod orchestrator;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

pub use config::{Config, FieldMappings, GitOverrides, Settings};
pub use git::GitContext;
pub use orchestrator::{JobOutcome, Orchestrator, RunOutcome, RunSummary, UploadPlan};
pub use scheduler::{QueueOptions, QueueReport, RetryPolicy, UploadQueue};
