//! Upload job domain types
//!
//! An upload is a directed acyclic graph of jobs stored in an arena. Jobs refer
//! to each other by [`JobId`] (their index); a job that needs a remote id
//! produced by another job names that job in its payload, which also makes it
//! a dependency.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::link::{CaseRef, LinkRequest};
use crate::dto::result::SubmitTestResult;
use crate::dto::run::CreateTestRun;

/// Index of a job in the upload graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub usize);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of remote write a job performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    CreateModule,
    CreateRun,
    SubmitResult,
    AttachLink,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::CreateModule => write!(f, "create_module"),
            JobKind::CreateRun => write!(f, "create_run"),
            JobKind::SubmitResult => write!(f, "submit_result"),
            JobKind::AttachLink => write!(f, "attach_link"),
        }
    }
}

/// Where a module (or a module's parent) lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleRef {
    /// Project root
    Root,
    /// Existing remote module
    Remote(u64),
    /// Module created by another job
    Job(JobId),
}

impl ModuleRef {
    fn job(&self) -> Option<JobId> {
        match self {
            ModuleRef::Job(id) => Some(*id),
            ModuleRef::Root | ModuleRef::Remote(_) => None,
        }
    }
}

/// Work carried by a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobPayload {
    /// Create one module under `parent`
    CreateModule { name: String, parent: ModuleRef },
    /// Create the test run that receives every result
    CreateRun(CreateTestRun),
    /// Submit one test case result into the run created by `run`
    SubmitResult {
        case: CaseRef,
        run: JobId,
        module: ModuleRef,
        result: SubmitTestResult,
    },
    /// Link the test case created by `result` to a requirement or GitHub reference
    AttachLink { link: LinkRequest, result: JobId },
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::CreateModule { .. } => JobKind::CreateModule,
            JobPayload::CreateRun(_) => JobKind::CreateRun,
            JobPayload::SubmitResult { .. } => JobKind::SubmitResult,
            JobPayload::AttachLink { .. } => JobKind::AttachLink,
        }
    }

    /// Jobs whose output this payload consumes
    pub fn referenced_jobs(&self) -> Vec<JobId> {
        match self {
            JobPayload::CreateModule { parent, .. } => parent.job().into_iter().collect(),
            JobPayload::CreateRun(_) => Vec::new(),
            JobPayload::SubmitResult { run, module, .. } => {
                std::iter::once(*run).chain(module.job()).collect()
            }
            JobPayload::AttachLink { result, .. } => vec![*result],
        }
    }

    /// Test case this job belongs to, if any
    pub fn case(&self) -> Option<&CaseRef> {
        match self {
            JobPayload::SubmitResult { case, .. } => Some(case),
            JobPayload::AttachLink { link, .. } => Some(&link.case),
            JobPayload::CreateModule { .. } | JobPayload::CreateRun(_) => None,
        }
    }

    /// Short human label used in logs and summaries
    pub fn label(&self) -> String {
        match self {
            JobPayload::CreateModule { name, .. } => format!("module '{}'", name),
            JobPayload::CreateRun(run) => format!("run '{}'", run.name),
            JobPayload::SubmitResult { case, .. } => format!("result of {}", case),
            JobPayload::AttachLink { link, .. } => {
                format!("{} link {} on {}", link.kind, link.target, link.case)
            }
        }
    }
}

/// A unit of queued work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadJob {
    pub id: JobId,
    pub payload: JobPayload,
    /// Jobs that must succeed before this one is dispatched
    pub dependencies: Vec<JobId>,
}

impl UploadJob {
    /// Creates a job depending on every job its payload references
    pub fn new(id: JobId, payload: JobPayload) -> Self {
        let dependencies = payload.referenced_jobs();
        Self {
            id,
            payload,
            dependencies,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.payload.kind()
    }
}

/// Lifecycle of a job inside the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    InFlight { attempt: u32 },
    RetryWait { attempt: u32, delay: Duration },
    Succeeded { output: Option<u64>, attempts: u32 },
    Failed(JobFailure),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded { .. } | JobState::Failed(_))
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, JobState::Succeeded { .. })
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match self {
            JobState::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Why a job ended without success
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    /// The remote API rejected the request with a non-retryable error
    Rejected { attempts: u32, message: String },
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, message: String },
    /// Never attempted because a dependency failed
    Cascade { ancestor: JobId },
}

impl JobFailure {
    pub fn is_cascade(&self) -> bool {
        matches!(self, JobFailure::Cascade { .. })
    }
}

impl std::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobFailure::Rejected { message, .. } => write!(f, "rejected: {}", message),
            JobFailure::Exhausted { attempts, message } => {
                write!(f, "gave up after {} attempt(s): {}", attempts, message)
            }
            JobFailure::Cascade { ancestor } => {
                write!(f, "skipped due to failure of job {}", ancestor)
            }
        }
    }
}
