//! Upload queue
//!
//! Drives a job graph to completion. Jobs become eligible once every
//! dependency has succeeded and are dispatched in insertion order, at most
//! `concurrency` at a time. Retryable failures back off and try again until
//! the attempt ceiling; any other failure is terminal and cascades to every
//! transitive dependent, which is then never attempted.
//!
//! [`UploadQueue::run`] returns only when every job is terminal.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use zigzag_client::{ClientError, QTestApi};
use zigzag_core::domain::job::{JobFailure, JobId, JobState, UploadJob};
use zigzag_core::{Result, ZigZagError};

use super::executor::{JobExecutor, Outputs};
use super::retry::RetryPolicy;

/// Queue tuning
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub project_id: u64,
    /// Max attempts in flight at once
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

/// Everything the queue knows about one job once the run is over
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job: UploadJob,
    pub state: JobState,
    /// Start of every attempt, in order
    pub dispatched_at: Vec<Instant>,
    /// When the job reached its terminal state
    pub finished_at: Option<Instant>,
    retry_due: bool,
}

impl JobRecord {
    fn new(job: UploadJob) -> Self {
        Self {
            job,
            state: JobState::Pending,
            dispatched_at: Vec::new(),
            finished_at: None,
            retry_due: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.dispatched_at.len() as u32
    }

    /// Remote id produced by the job, if it succeeded with one
    pub fn output(&self) -> Option<u64> {
        match self.state {
            JobState::Succeeded { output, .. } => output,
            _ => None,
        }
    }
}

/// Final state of every job, indexed by [`JobId`]
#[derive(Debug, Clone)]
pub struct QueueReport {
    records: Vec<JobRecord>,
    pub elapsed: Duration,
}

impl QueueReport {
    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn record(&self, id: JobId) -> Option<&JobRecord> {
        self.records.get(id.0)
    }

    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.state.is_succeeded()).count()
    }

    /// Jobs rejected by the remote API
    pub fn rejected(&self) -> usize {
        self.count_failures(|f| matches!(f, JobFailure::Rejected { .. }))
    }

    /// Jobs that ran out of attempts
    pub fn exhausted(&self) -> usize {
        self.count_failures(|f| matches!(f, JobFailure::Exhausted { .. }))
    }

    /// Jobs skipped because a dependency failed
    pub fn cascaded(&self) -> usize {
        self.count_failures(JobFailure::is_cascade)
    }

    pub fn is_success(&self) -> bool {
        self.records.iter().all(|r| r.state.is_succeeded())
    }

    fn count_failures(&self, predicate: impl Fn(&JobFailure) -> bool) -> usize {
        self.records
            .iter()
            .filter_map(|r| r.state.failure())
            .filter(|f| predicate(f))
            .count()
    }
}

enum Event {
    Attempted {
        id: JobId,
        result: std::result::Result<Option<u64>, ClientError>,
    },
    BackoffElapsed {
        id: JobId,
    },
}

/// Dispatches an upload job graph against the remote API
pub struct UploadQueue {
    executor: JobExecutor,
    options: QueueOptions,
    semaphore: Arc<Semaphore>,
}

impl UploadQueue {
    pub fn new(api: Arc<dyn QTestApi>, options: QueueOptions) -> Self {
        let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
        Self {
            executor: JobExecutor::new(api, options.project_id),
            options,
            semaphore,
        }
    }

    /// Runs every job to a terminal state
    ///
    /// Fails without sending anything when the graph is malformed: ids out of
    /// order, unknown dependencies or a dependency cycle.
    pub async fn run(&self, jobs: Vec<UploadJob>) -> Result<QueueReport> {
        let dependents = validate_graph(&jobs)?;
        let started = Instant::now();

        info!(
            "Dispatching {} job(s) (concurrency: {}, max attempts: {})",
            jobs.len(),
            self.options.concurrency,
            self.options.retry.max_attempts
        );

        let mut records: Vec<JobRecord> = jobs.into_iter().map(JobRecord::new).collect();
        let mut outputs = Outputs::new();
        let mut tasks: JoinSet<Event> = JoinSet::new();

        loop {
            self.dispatch_ready(&mut records, &outputs, &mut tasks);

            let Some(joined) = tasks.join_next().await else {
                break;
            };

            let event = match joined {
                Ok(event) => event,
                Err(e) => {
                    // Wrapper tasks never panic, only cancellation lands here
                    return Err(ZigZagError::general(format!("upload task failed: {}", e)));
                }
            };

            match event {
                Event::BackoffElapsed { id } => {
                    records[id.0].retry_due = true;
                }
                Event::Attempted { id, result } => {
                    self.complete_attempt(
                        id,
                        result,
                        &mut records,
                        &mut outputs,
                        &dependents,
                        &mut tasks,
                    );
                }
            }
        }

        let report = QueueReport {
            records,
            elapsed: started.elapsed(),
        };

        info!(
            "Queue finished in {:?}: {} succeeded, {} rejected, {} exhausted, {} skipped",
            report.elapsed,
            report.succeeded(),
            report.rejected(),
            report.exhausted(),
            report.cascaded()
        );

        Ok(report)
    }

    /// Starts every eligible job the semaphore has room for, in insertion order
    fn dispatch_ready(
        &self,
        records: &mut [JobRecord],
        outputs: &Outputs,
        tasks: &mut JoinSet<Event>,
    ) {
        for idx in 0..records.len() {
            let eligible = match records[idx].state {
                JobState::Pending => records[idx]
                    .job
                    .dependencies
                    .iter()
                    .all(|dep| records[dep.0].state.is_succeeded()),
                JobState::RetryWait { .. } => records[idx].retry_due,
                _ => false,
            };

            if !eligible {
                continue;
            }

            // Try to acquire semaphore permit, stop if at max capacity
            let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
                debug!("Concurrency limit reached, holding remaining jobs");
                break;
            };

            let record = &mut records[idx];
            let attempt = record.attempts() + 1;
            record.state = JobState::InFlight { attempt };
            record.retry_due = false;
            record.dispatched_at.push(Instant::now());

            debug!(
                "Dispatching job {} {} (attempt {})",
                record.job.id,
                record.job.payload.label(),
                attempt
            );

            self.spawn_attempt(record.job.clone(), outputs, permit, tasks);
        }
    }

    /// Spawns a single attempt in its own task
    fn spawn_attempt(
        &self,
        job: UploadJob,
        outputs: &Outputs,
        permit: OwnedSemaphorePermit,
        tasks: &mut JoinSet<Event>,
    ) {
        let executor = self.executor.clone();
        let inputs: Outputs = job
            .dependencies
            .iter()
            .filter_map(|dep| outputs.get(dep).map(|output| (*dep, *output)))
            .collect();
        let id = job.id;

        let attempt = tokio::spawn(async move {
            let result = executor.execute(&job.payload, &inputs).await;
            // Permit is released when the attempt ends
            drop(permit);
            result
        });

        tasks.spawn(async move {
            let result = attempt.await.unwrap_or_else(|e| {
                Err(ClientError::InternalError(format!("attempt task failed: {}", e)))
            });
            Event::Attempted { id, result }
        });
    }

    fn complete_attempt(
        &self,
        id: JobId,
        result: std::result::Result<Option<u64>, ClientError>,
        records: &mut [JobRecord],
        outputs: &mut Outputs,
        dependents: &[Vec<JobId>],
        tasks: &mut JoinSet<Event>,
    ) {
        let record = &mut records[id.0];
        let attempts = record.attempts();
        let label = record.job.payload.label();

        let failure = match result {
            Ok(output) => {
                if attempts > 1 {
                    info!("Job {} {} succeeded after {} attempt(s)", id, label, attempts);
                } else {
                    debug!("Job {} {} succeeded", id, label);
                }
                if let Some(output) = output {
                    outputs.insert(id, output);
                }
                record.state = JobState::Succeeded { output, attempts };
                record.finished_at = Some(Instant::now());
                return;
            }
            Err(e) if e.is_retryable() => match self.options.retry.delay_after(attempts) {
                Some(delay) => {
                    warn!(
                        "Job {} {} failed (attempt {}/{}): {}",
                        id, label, attempts, self.options.retry.max_attempts, e
                    );
                    warn!("Retrying in {:?}...", delay);
                    record.state = JobState::RetryWait {
                        attempt: attempts,
                        delay,
                    };
                    tasks.spawn(async move {
                        tokio::time::sleep(delay).await;
                        Event::BackoffElapsed { id }
                    });
                    return;
                }
                None => JobFailure::Exhausted {
                    attempts,
                    message: e.to_string(),
                },
            },
            Err(e) => JobFailure::Rejected {
                attempts,
                message: e.to_string(),
            },
        };

        error!("Job {} {} failed: {}", id, label, failure);
        record.state = JobState::Failed(failure);
        record.finished_at = Some(Instant::now());

        cascade(id, records, dependents);
    }
}

/// Marks every transitive dependent of `failed` as skipped
fn cascade(failed: JobId, records: &mut [JobRecord], dependents: &[Vec<JobId>]) {
    let mut queue: VecDeque<JobId> = dependents[failed.0].iter().copied().collect();
    let now = Instant::now();

    while let Some(id) = queue.pop_front() {
        let record = &mut records[id.0];
        if record.state.is_terminal() {
            continue;
        }

        debug!("Skipping job {} {}", id, record.job.payload.label());
        record.state = JobState::Failed(JobFailure::Cascade { ancestor: failed });
        record.finished_at = Some(now);
        queue.extend(dependents[id.0].iter().copied());
    }
}

/// Checks ids and dependencies, returning the dependents of every job
fn validate_graph(jobs: &[UploadJob]) -> Result<Vec<Vec<JobId>>> {
    let mut dependents = vec![Vec::new(); jobs.len()];
    let mut in_degree = vec![0usize; jobs.len()];

    for (idx, job) in jobs.iter().enumerate() {
        if job.id.0 != idx {
            return Err(ZigZagError::general(format!(
                "job {} stored at position {}",
                job.id, idx
            )));
        }

        for dep in &job.dependencies {
            if dep.0 >= jobs.len() {
                return Err(ZigZagError::general(format!(
                    "job {} depends on unknown job {}",
                    job.id, dep
                )));
            }
            dependents[dep.0].push(job.id);
            in_degree[idx] += 1;
        }
    }

    // Kahn's algorithm: anything left unvisited sits on a cycle
    let mut ready: VecDeque<usize> = (0..jobs.len()).filter(|i| in_degree[*i] == 0).collect();
    let mut visited = 0;

    while let Some(idx) = ready.pop_front() {
        visited += 1;
        for dependent in &dependents[idx] {
            in_degree[dependent.0] -= 1;
            if in_degree[dependent.0] == 0 {
                ready.push_back(dependent.0);
            }
        }
    }

    if visited != jobs.len() {
        let on_cycle = in_degree
            .iter()
            .position(|degree| *degree > 0)
            .map(|idx| jobs[idx].id.to_string())
            .unwrap_or_default();
        return Err(ZigZagError::general(format!(
            "dependency cycle involving job {}",
            on_cycle
        )));
    }

    Ok(dependents)
}
