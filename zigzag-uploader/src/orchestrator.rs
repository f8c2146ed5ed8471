//! Upload orchestration
//!
//! Turns a parsed [`TestLog`] into a job graph (modules, run, results, links),
//! drives it through the [`UploadQueue`] and summarizes what happened.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use zigzag_client::{QTestApi, QTestClient};
use zigzag_core::domain::job::{JobFailure, JobId, JobKind, JobPayload, ModuleRef, UploadJob};
use zigzag_core::domain::link::CaseRef;
use zigzag_core::domain::log::{Outcome, OutcomeCounts, TestCase, TestLog};
use zigzag_core::domain::module::{ModuleTree, NodeId};
use zigzag_core::dto::module::RemoteModule;
use zigzag_core::dto::result::{SubmitTestResult, TestStepLog};
use zigzag_core::dto::run::{CreateTestRun, RunProperty};
use zigzag_core::util::{self, format_duration};
use zigzag_core::{Result, ZigZagError};

use crate::config::{Config, Settings};
use crate::git::GitContext;
use crate::scheduler::{QueueOptions, QueueReport, UploadQueue};
use crate::service::{LinkExtractor, ModuleHierarchy};

/// Run name used when none is configured
pub const DEFAULT_RUN_NAME: &str = "ZigZag upload";

/// A case dropped while planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseError {
    pub case: CaseRef,
    pub message: String,
}

/// Job graph for one report, plus what planning had to leave out
#[derive(Debug, Clone)]
pub struct UploadPlan {
    pub jobs: Vec<UploadJob>,
    /// Id of the `CreateRun` job
    pub run_job: JobId,
    pub case_errors: Vec<CaseError>,
    pub warnings: Vec<String>,
}

impl UploadPlan {
    pub fn count(&self, kind: JobKind) -> usize {
        self.jobs.iter().filter(|job| job.kind() == kind).count()
    }

    fn push(&mut self, payload: JobPayload) -> JobId {
        let id = JobId(self.jobs.len());
        self.jobs.push(UploadJob::new(id, payload));
        id
    }
}

/// Final state of one job, as reported to the user
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub id: JobId,
    pub kind: JobKind,
    pub label: String,
    /// Qualified name of the case the job belongs to
    pub case: Option<String>,
    pub attempts: u32,
    /// `None` on success
    pub failure: Option<JobFailure>,
}

/// Overall result of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// Some jobs failed or some cases could not be planned
    PartialFailure,
}

/// What an upload did
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_name: String,
    /// Remote id of the created test run
    pub run_id: Option<u64>,
    /// Test outcomes found in the report
    pub tests: OutcomeCounts,
    pub jobs: Vec<JobOutcome>,
    pub succeeded: usize,
    pub rejected: usize,
    pub exhausted: usize,
    pub cascaded: usize,
    pub case_errors: Vec<CaseError>,
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

impl RunSummary {
    fn new(run_name: String, log: &TestLog, plan: UploadPlan, report: &QueueReport) -> Self {
        let jobs = report
            .records()
            .iter()
            .map(|record| JobOutcome {
                id: record.job.id,
                kind: record.job.kind(),
                label: record.job.payload.label(),
                case: record.job.payload.case().map(|c| c.qualified_name.clone()),
                attempts: record.attempts(),
                failure: record.state.failure().cloned(),
            })
            .collect();

        Self {
            run_name,
            run_id: report.record(plan.run_job).and_then(|r| r.output()),
            tests: log.counts(),
            jobs,
            succeeded: report.succeeded(),
            rejected: report.rejected(),
            exhausted: report.exhausted(),
            cascaded: report.cascaded(),
            case_errors: plan.case_errors,
            warnings: plan.warnings,
            elapsed: report.elapsed,
        }
    }

    /// Jobs that did not succeed, in job order
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.jobs.iter().filter(|job| job.failure.is_some())
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.failures().next().is_none() && self.case_errors.is_empty() {
            RunOutcome::Success
        } else {
            RunOutcome::PartialFailure
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome() == RunOutcome::Success
    }
}

/// Plans and runs the upload of one report into one project
pub struct Orchestrator {
    settings: Settings,
    api: Arc<dyn QTestApi>,
    git: GitContext,
    run_name: Option<String>,
}

impl Orchestrator {
    /// Validates the configuration; nothing is sent before this succeeds
    pub fn new(config: Config, api: Arc<dyn QTestApi>) -> Result<Self> {
        let settings = Settings::try_from(config)?;
        Ok(Self {
            settings,
            api,
            git: GitContext::default(),
            run_name: None,
        })
    }

    /// Validates the configuration and connects to the configured instance
    pub fn connect(config: Config) -> Result<Self> {
        let settings = Settings::try_from(config)?;
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| ZigZagError::general(format!("failed to build HTTP client: {}", e)))?;
        let api = Arc::new(QTestClient::with_client(
            settings.base_url.clone(),
            settings.api_token.clone(),
            http,
        ));

        Ok(Self {
            settings,
            api,
            git: GitContext::default(),
            run_name: None,
        })
    }

    pub fn with_git(mut self, git: GitContext) -> Self {
        self.git = git;
        self
    }

    /// Uses a fixed run name instead of the generated one
    pub fn with_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = Some(run_name.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Stable run name for the given report bytes
    pub fn run_name_for(&self, report: &[u8]) -> String {
        util::run_name(
            self.settings.run_name.as_deref().unwrap_or(DEFAULT_RUN_NAME),
            report,
            self.settings.project_id,
            self.git.commit.as_deref(),
        )
    }

    fn run_name(&self, log: &TestLog) -> String {
        self.run_name
            .clone()
            .unwrap_or_else(|| self.run_name_for(log.source.as_bytes()))
    }

    /// Builds the job graph for `log`
    ///
    /// Missing modules are appended to `tree` as pending nodes. A case that
    /// cannot be planned is recorded in [`UploadPlan::case_errors`] and left
    /// out; the other cases are unaffected.
    pub fn plan(&self, log: &TestLog, tree: &mut ModuleTree) -> UploadPlan {
        let hierarchy = ModuleHierarchy::new(self.settings.root_module.as_deref());
        let extractor =
            LinkExtractor::new(&self.settings.field_mappings, self.git.repository.clone());

        let mut plan = UploadPlan {
            jobs: Vec::new(),
            run_job: JobId(0),
            case_errors: Vec::new(),
            warnings: Vec::new(),
        };
        plan.run_job = plan.push(JobPayload::CreateRun(self.run_request(log)));

        let mut module_jobs: HashMap<NodeId, JobId> = HashMap::new();
        let now = Utc::now();

        for (suite_idx, case_idx, case) in log.cases() {
            let case_ref = CaseRef {
                suite: suite_idx,
                case: case_idx,
                qualified_name: case.qualified_name(),
            };
            let suite = &log.suites()[suite_idx];
            let started = suite.timestamp.or(log.timestamp).unwrap_or(now);

            let planned = self
                .plan_module(&hierarchy, tree, &suite.name, case, &mut plan, &mut module_jobs)
                .and_then(|module| {
                    let result = submit_request(case, started)?;
                    Ok(plan.push(JobPayload::SubmitResult {
                        case: case_ref.clone(),
                        run: plan.run_job,
                        module,
                        result,
                    }))
                });

            let result_job = match planned {
                Ok(job) => job,
                Err(e) => {
                    warn!("Skipping {}: {}", case_ref, e);
                    plan.case_errors.push(CaseError {
                        case: case_ref,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let extraction = extractor.extract(&case_ref, &case.properties);
            for warning in extraction.warnings {
                warn!("{}", warning);
                plan.warnings.push(warning);
            }
            for link in extraction.links {
                plan.push(JobPayload::AttachLink {
                    link,
                    result: result_job,
                });
            }
        }

        info!(
            "Planned {} job(s): {} module(s), {} result(s), {} link(s), {} case(s) skipped",
            plan.jobs.len(),
            plan.count(JobKind::CreateModule),
            plan.count(JobKind::SubmitResult),
            plan.count(JobKind::AttachLink),
            plan.case_errors.len()
        );

        plan
    }

    /// Resolves the module of `case`, adding a job for every new module
    fn plan_module(
        &self,
        hierarchy: &ModuleHierarchy,
        tree: &mut ModuleTree,
        suite: &str,
        case: &TestCase,
        plan: &mut UploadPlan,
        module_jobs: &mut HashMap<NodeId, JobId>,
    ) -> Result<ModuleRef> {
        if case.name.trim().is_empty() {
            return Err(ZigZagError::required_property("test case name is empty"));
        }

        let resolution = hierarchy.resolve(tree, suite, case)?;

        for node_id in &resolution.created {
            let node = tree
                .node(*node_id)
                .ok_or_else(|| ZigZagError::general(format!("unknown module node {}", node_id.0)))?;
            let parent = module_ref(tree, module_jobs, node.parent)?;
            let job = plan.push(JobPayload::CreateModule {
                name: node.name.clone(),
                parent,
            });
            module_jobs.insert(*node_id, job);
        }

        module_ref(tree, module_jobs, resolution.leaf())
    }

    fn run_request(&self, log: &TestLog) -> CreateTestRun {
        let mut properties = vec![RunProperty {
            name: "source".to_string(),
            value: log.source.clone(),
        }];
        let git = [
            ("branch", self.git.branch.as_deref()),
            ("commit", self.git.commit.as_deref()),
            ("repository", self.git.repository.as_deref()),
        ];
        properties.extend(git.iter().filter_map(|(name, value)| {
            value.map(|value| RunProperty {
                name: name.to_string(),
                value: value.to_string(),
            })
        }));

        let counts = log.counts();
        let mut description = format!(
            "{} test(s) from {}: {} passed, {} failed, {} errors, {} skipped",
            counts.total(),
            log.source,
            counts.passed,
            counts.failed,
            counts.errors,
            counts.skipped
        );
        if let (Some(branch), Some(commit)) = (&self.git.branch, self.git.short_commit()) {
            description.push_str(&format!(" ({} @ {})", branch, commit));
        }

        CreateTestRun {
            name: self.run_name(log),
            description,
            properties,
        }
    }

    /// Fetches the module tree, plans and uploads `log`
    ///
    /// Errors returned here happen before dispatch. Once jobs are dispatched
    /// every outcome ends up in the [`RunSummary`].
    pub async fn run(&self, log: &TestLog) -> Result<RunSummary> {
        let project_id = self.settings.project_id;
        info!("Uploading {} to project {}", log.source, project_id);

        let modules = self.fetch_modules().await?;
        let mut tree = ModuleTree::from_remote(modules);
        debug!("Project has {} known module(s)", tree.len());

        let run_name = self.run_name(log);
        let plan = self.plan(log, &mut tree);

        let queue = UploadQueue::new(
            Arc::clone(&self.api),
            QueueOptions {
                project_id,
                concurrency: self.settings.concurrency,
                retry: self.settings.retry,
            },
        );
        let report = queue.run(plan.jobs.clone()).await?;

        let summary = RunSummary::new(run_name, log, plan, &report);
        match summary.outcome() {
            RunOutcome::Success => info!(
                "Upload of '{}' complete in {}",
                summary.run_name,
                format_duration(summary.elapsed)
            ),
            RunOutcome::PartialFailure => error!(
                "Upload of '{}' finished with {} failed job(s) and {} skipped case(s)",
                summary.run_name,
                summary.failures().count(),
                summary.case_errors.len()
            ),
        }

        Ok(summary)
    }

    /// Reads the module tree once, retrying transient failures
    async fn fetch_modules(&self) -> Result<Vec<RemoteModule>> {
        let retry = self.settings.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.api.list_modules(self.settings.project_id).await {
                Ok(modules) => {
                    if attempt > 1 {
                        info!("Fetched module tree after {} attempt(s)", attempt);
                    }
                    return Ok(modules);
                }
                Err(e) => {
                    let delay = e
                        .is_retryable()
                        .then(|| retry.delay_after(attempt))
                        .flatten();
                    let Some(delay) = delay else {
                        return Err(ZigZagError::general(format!(
                            "failed to fetch module tree after {} attempt(s): {}",
                            attempt, e
                        )));
                    };

                    warn!(
                        "Failed to fetch module tree (attempt {}/{}): {}",
                        attempt, retry.max_attempts, e
                    );
                    warn!("Retrying in {:?}...", delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Where the module `node` lives for a job: project root, existing module or
/// module created by an earlier job
fn module_ref(
    tree: &ModuleTree,
    module_jobs: &HashMap<NodeId, JobId>,
    node: Option<NodeId>,
) -> Result<ModuleRef> {
    let Some(node_id) = node else {
        return Ok(ModuleRef::Root);
    };

    if let Some(remote_id) = tree.node(node_id).and_then(|n| n.remote_id) {
        return Ok(ModuleRef::Remote(remote_id));
    }

    module_jobs
        .get(&node_id)
        .map(|job| ModuleRef::Job(*job))
        .ok_or_else(|| {
            ZigZagError::general(format!(
                "module '{}' has no creating job",
                tree.path_of(node_id)
            ))
        })
}

/// Result payload for one case
fn submit_request(case: &TestCase, started: DateTime<Utc>) -> Result<SubmitTestResult> {
    let finished = TimeDelta::from_std(case.time)
        .ok()
        .and_then(|elapsed| started.checked_add_signed(elapsed))
        .ok_or_else(|| {
            ZigZagError::general(format!("{}: duration out of range", case.qualified_name()))
        })?;

    let note = match &case.outcome {
        Outcome::Failed(detail) | Outcome::Error(detail) => Some(detail.summary()),
        Outcome::Skipped { message } => message.clone(),
        Outcome::Passed => None,
    };

    let test_step_logs = case
        .steps
        .iter()
        .map(|step| TestStepLog {
            order: step.index,
            description: step.description.clone(),
            status: step.outcome.status(),
            actual_result: step.outcome.failure().map(|f| f.summary()),
        })
        .collect();

    Ok(SubmitTestResult {
        name: case.name.clone(),
        automation_content: case.qualified_name(),
        status: case.outcome.status(),
        exe_start_date: started,
        exe_end_date: finished,
        module_id: None,
        note,
        test_step_logs,
        properties: case
            .properties
            .iter()
            .map(|(name, value)| RunProperty {
                name: name.clone(),
                value: value.clone(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeApi;
    use zigzag_client::ClientError;
    use zigzag_core::ErrorKind;

    fn config() -> Config {
        Config {
            base_url: Some("https://qtest.example.com".to_string()),
            api_token: Some("token".to_string()),
            project_id: Some(7),
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            ..Config::default()
        }
    }

    fn parse(xml: &str) -> TestLog {
        zigzag_junit::parse_test_log(xml.as_bytes(), "report.xml").unwrap()
    }

    fn orchestrator(api: &Arc<FakeApi>) -> Orchestrator {
        let api: Arc<dyn QTestApi> = api.clone();
        Orchestrator::new(config(), api).unwrap()
    }

    const SINGLE_PASS: &str = r#"
<testsuite name="unit" tests="1">
  <testcase classname="pkg" name="test_a" time="0.25"/>
</testsuite>"#;

    #[tokio::test]
    async fn test_single_passing_case() {
        let api = Arc::new(FakeApi::new());
        let summary = orchestrator(&api).run(&parse(SINGLE_PASS)).await.unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.tests.passed, 1);
        assert_eq!(summary.jobs.len(), 3);
        assert_eq!(summary.succeeded, 3);
        assert!(summary.run_id.is_some());

        let calls = api.calls();
        assert_eq!(calls[0], "list_modules");
        assert!(calls.contains(&"create_module pkg parent=root".to_string()));
        assert!(calls.iter().any(|c| c.starts_with("submit pkg.test_a run=")));
    }

    #[test]
    fn test_plan_shape() {
        let api = Arc::new(FakeApi::new());
        let log = parse(
            r#"
<testsuite name="unit">
  <testcase classname="api.users" name="a"/>
  <testcase classname="api.users" name="b"/>
  <testcase classname="api" name="c"/>
</testsuite>"#,
        );
        let mut tree = ModuleTree::new();
        let plan = orchestrator(&api).plan(&log, &mut tree);

        assert_eq!(plan.run_job, JobId(0));
        assert_eq!(plan.count(JobKind::CreateRun), 1);
        assert_eq!(plan.count(JobKind::CreateModule), 2);
        assert_eq!(plan.count(JobKind::SubmitResult), 3);

        // api (#1), users (#2) under api, then a, b under users and c under api
        assert_eq!(
            plan.jobs[2].payload,
            JobPayload::CreateModule {
                name: "users".to_string(),
                parent: ModuleRef::Job(JobId(1)),
            }
        );
        assert_eq!(plan.jobs[3].dependencies, vec![JobId(0), JobId(2)]);
        assert_eq!(plan.jobs[4].dependencies, vec![JobId(0), JobId(2)]);
        assert_eq!(plan.jobs[5].dependencies, vec![JobId(0), JobId(1)]);
        assert_eq!(tree.len(), 2);
    }

    #[tokio::test]
    async fn test_existing_modules_are_reused() {
        let api = Arc::new(FakeApi::new().with_modules(vec![RemoteModule {
            id: 10,
            name: "pkg".to_string(),
            parent_id: None,
            children: vec![],
        }]));
        let summary = orchestrator(&api).run(&parse(SINGLE_PASS)).await.unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.jobs.len(), 2);
        assert!(!api.calls().iter().any(|c| c.starts_with("create_module")));
        assert!(api.calls().iter().any(|c| c.ends_with("module=10")));
    }

    #[tokio::test]
    async fn test_requirement_link_depends_on_result() {
        let api = Arc::new(FakeApi::new().with_requirement("REQ-42", 42));
        let log = parse(
            r#"
<testsuite name="unit">
  <testcase classname="pkg" name="test_a">
    <properties><property name="req" value="REQ-42"/></properties>
  </testcase>
</testsuite>"#,
        );

        let orchestrator = orchestrator(&api);
        let plan = orchestrator.plan(&log, &mut ModuleTree::new());
        let link = plan
            .jobs
            .iter()
            .find(|job| job.kind() == JobKind::AttachLink)
            .unwrap();
        let result = plan
            .jobs
            .iter()
            .find(|job| job.kind() == JobKind::SubmitResult)
            .unwrap();
        assert_eq!(link.dependencies, vec![result.id]);

        let summary = orchestrator.run(&log).await.unwrap();
        assert!(summary.is_success());

        let calls = api.calls();
        let submit = calls.iter().position(|c| c.starts_with("submit")).unwrap();
        let linked = calls
            .iter()
            .position(|c| c.starts_with("link_requirement 42 -> "))
            .unwrap();
        assert!(submit < linked);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let api = Arc::new(FakeApi::new());
        api.fail_next(
            "submit pkg.test_a",
            vec![
                ClientError::api_error(503, "unavailable"),
                ClientError::api_error(503, "unavailable"),
            ],
        );

        let summary = orchestrator(&api).run(&parse(SINGLE_PASS)).await.unwrap();

        assert!(summary.is_success());
        let submit = summary
            .jobs
            .iter()
            .find(|job| job.kind == JobKind::SubmitResult)
            .unwrap();
        assert_eq!(submit.attempts, 3);
        assert!(submit.failure.is_none());
    }

    #[test]
    fn test_missing_project_id_fails_before_any_job() {
        let api = Arc::new(FakeApi::new());
        let mut config = config();
        config.project_id = None;

        let err = Orchestrator::new(config, api.clone()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unplannable_case_is_isolated() {
        let api = Arc::new(FakeApi::new());
        let log = parse(
            r#"
<testsuite name="unit">
  <testcase name=""/>
  <testcase classname="pkg" name="test_a"/>
</testsuite>"#,
        );

        let summary = orchestrator(&api).run(&log).await.unwrap();

        assert_eq!(summary.outcome(), RunOutcome::PartialFailure);
        assert_eq!(summary.case_errors.len(), 1);
        assert_eq!(summary.case_errors[0].case.qualified_name, "");
        assert_eq!(summary.failures().count(), 0);
        assert!(api.calls().iter().any(|c| c.starts_with("submit pkg.test_a")));
    }

    #[test]
    fn test_case_without_classname_is_filed_under_suite() {
        let api = Arc::new(FakeApi::new());
        let log = parse(r#"<testsuite name="smoke"><testcase name="test_login"/></testsuite>"#);

        let mut tree = ModuleTree::new();
        let plan = orchestrator(&api).plan(&log, &mut tree);

        assert!(plan.case_errors.is_empty());
        assert_eq!(plan.count(JobKind::SubmitResult), 1);
        assert_eq!(
            plan.jobs[1].payload,
            JobPayload::CreateModule {
                name: "smoke".to_string(),
                parent: ModuleRef::Root,
            }
        );
    }

    #[test]
    fn test_out_of_range_duration_is_isolated() {
        let api = Arc::new(FakeApi::new());
        let log = parse(
            r#"
<testsuite name="unit">
  <testcase classname="pkg" name="slow" time="100000000000000"/>
  <testcase classname="pkg" name="fast" time="0.5"/>
</testsuite>"#,
        );

        let plan = orchestrator(&api).plan(&log, &mut ModuleTree::new());

        assert_eq!(plan.case_errors.len(), 1);
        assert_eq!(plan.case_errors[0].case.qualified_name, "pkg.slow");
        assert!(plan.case_errors[0].message.contains("duration out of range"));
        assert_eq!(plan.count(JobKind::SubmitResult), 1);
    }

    #[tokio::test]
    async fn test_unknown_requirement_fails_only_the_link() {
        let api = Arc::new(FakeApi::new());
        let log = parse(
            r#"
<testsuite name="unit">
  <testcase classname="pkg" name="test_a">
    <properties><property name="req" value="REQ-404"/></properties>
  </testcase>
</testsuite>"#,
        );

        let summary = orchestrator(&api).run(&log).await.unwrap();

        assert!(!summary.is_success());
        let failures: Vec<_> = summary.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind, JobKind::AttachLink);
        assert_eq!(failures[0].case.as_deref(), Some("pkg.test_a"));
        assert_eq!(summary.rejected, 1);
    }

    #[tokio::test]
    async fn test_failed_module_cascades_to_results() {
        let api = Arc::new(FakeApi::new());
        api.fail_next("create_module pkg", vec![ClientError::api_error(403, "forbidden")]);

        let summary = orchestrator(&api).run(&parse(SINGLE_PASS)).await.unwrap();

        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.cascaded, 1);
        assert!(!api.calls().iter().any(|c| c.starts_with("submit")));
    }

    #[tokio::test]
    async fn test_module_tree_fetch_failure_aborts() {
        let api = Arc::new(FakeApi::new());
        api.fail_next("list_modules", vec![ClientError::api_error(401, "unauthorized")]);

        let err = orchestrator(&api).run(&parse(SINGLE_PASS)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::General);
        assert_eq!(api.calls(), vec!["list_modules".to_string()]);
    }

    #[test]
    fn test_run_name_is_stable() {
        let api = Arc::new(FakeApi::new());
        let orchestrator = orchestrator(&api);
        let first = orchestrator.run_name_for(SINGLE_PASS.as_bytes());

        assert_eq!(first, orchestrator.run_name_for(SINGLE_PASS.as_bytes()));
        assert!(first.starts_with(DEFAULT_RUN_NAME));
        assert_ne!(first, orchestrator.run_name_for(b"<testsuite name=\"other\"/>"));
    }

    #[test]
    fn test_failure_detail_becomes_note_and_steps() {
        let log = parse(
            r#"
<testsuite name="unit">
  <testcase classname="pkg" name="test_a" time="1.5">
    <failure message="expected 2"/>
    <steps>
      <step index="1" name="open"/>
      <step index="2" name="check"><failure message="mismatch"/></step>
    </steps>
  </testcase>
</testsuite>"#,
        );
        let (_, _, case) = log.cases().next().unwrap();
        let started = Utc::now();
        let result = submit_request(case, started).unwrap();

        assert_eq!(result.note.as_deref(), Some("expected 2"));
        assert_eq!(
            result.exe_end_date - result.exe_start_date,
            TimeDelta::milliseconds(1500)
        );
        assert_eq!(result.test_step_logs.len(), 2);
        assert_eq!(
            result.test_step_logs[1].actual_result.as_deref(),
            Some("mismatch")
        );
    }
}
