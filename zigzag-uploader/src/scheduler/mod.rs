//! Scheduler layer
//!
//! Turns a job graph into remote calls: eligibility, bounded dispatch,
//! retries with backoff and failure cascading.

pub mod executor;
pub mod queue;
pub mod retry;

pub use queue::{JobRecord, QueueOptions, QueueReport, UploadQueue};
pub use retry::RetryPolicy;
