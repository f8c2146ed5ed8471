//! In-memory qTest API for tests

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use zigzag_client::{ClientError, QTestApi, Result};
use zigzag_core::dto::link::{ExternalLink, Requirement};
use zigzag_core::dto::module::{CreateModule, RemoteModule};
use zigzag_core::dto::result::{SubmitTestResult, SubmittedResult};
use zigzag_core::dto::run::{CreateTestRun, TestRun};

/// Records every call as a short string and answers with fresh ids
///
/// Call keys: `list_modules`, `create_module <name> parent=<id|root>`,
/// `create_run`, `submit <automation content> run=<id> module=<id|none>`,
/// `find_requirement <id>`, `link_requirement <req> -> <tc>`,
/// `external_link <tc> <url>`. Failures queued with [`FakeApi::fail_next`]
/// are matched on the key prefix.
#[derive(Default)]
pub struct FakeApi {
    modules: Vec<RemoteModule>,
    requirements: HashMap<String, u64>,
    latency: Duration,
    next_id: AtomicU64,
    calls: Mutex<Vec<String>>,
    failures: Mutex<Vec<(String, VecDeque<ClientError>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ..Self::default()
        }
    }

    pub fn with_modules(mut self, modules: Vec<RemoteModule>) -> Self {
        self.modules = modules;
        self
    }

    pub fn with_requirement(mut self, identifier: &str, id: u64) -> Self {
        self.requirements.insert(identifier.to_string(), id);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes the next calls whose key starts with `prefix` fail, in order
    pub fn fail_next(&self, prefix: &str, errors: Vec<ClientError>) {
        self.failures
            .lock()
            .unwrap()
            .push((prefix.to_string(), errors.into()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn call(&self, key: String) -> Result<u64> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.calls.lock().unwrap().push(key.clone());
        let failure = self
            .failures
            .lock()
            .unwrap()
            .iter_mut()
            .find(|(prefix, errors)| key.starts_with(prefix.as_str()) && !errors.is_empty())
            .and_then(|(_, errors)| errors.pop_front());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match failure {
            Some(err) => Err(err),
            None => Ok(self.next_id.fetch_add(1, Ordering::SeqCst)),
        }
    }
}

fn id_or(id: Option<u64>, fallback: &str) -> String {
    id.map(|id| id.to_string())
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl QTestApi for FakeApi {
    async fn list_modules(&self, _project_id: u64) -> Result<Vec<RemoteModule>> {
        self.call("list_modules".to_string()).await?;
        Ok(self.modules.clone())
    }

    async fn create_module(
        &self,
        _project_id: u64,
        parent_id: Option<u64>,
        req: CreateModule,
    ) -> Result<RemoteModule> {
        let id = self
            .call(format!(
                "create_module {} parent={}",
                req.name,
                id_or(parent_id, "root")
            ))
            .await?;
        Ok(RemoteModule {
            id,
            name: req.name,
            parent_id,
            children: Vec::new(),
        })
    }

    async fn create_test_run(&self, _project_id: u64, req: CreateTestRun) -> Result<TestRun> {
        let id = self.call("create_run".to_string()).await?;
        Ok(TestRun { id, name: req.name })
    }

    async fn submit_test_result(
        &self,
        _project_id: u64,
        run_id: u64,
        req: SubmitTestResult,
    ) -> Result<SubmittedResult> {
        let id = self
            .call(format!(
                "submit {} run={} module={}",
                req.automation_content,
                run_id,
                id_or(req.module_id, "none")
            ))
            .await?;
        Ok(SubmittedResult {
            id,
            test_case_id: id + 50_000,
        })
    }

    async fn find_requirement(
        &self,
        _project_id: u64,
        identifier: &str,
    ) -> Result<Option<Requirement>> {
        self.call(format!("find_requirement {}", identifier)).await?;
        Ok(self.requirements.get(identifier).map(|id| Requirement {
            id: *id,
            name: identifier.to_string(),
        }))
    }

    async fn link_requirement(
        &self,
        _project_id: u64,
        requirement_id: u64,
        test_case_id: u64,
    ) -> Result<()> {
        self.call(format!("link_requirement {} -> {}", requirement_id, test_case_id))
            .await?;
        Ok(())
    }

    async fn attach_external_link(
        &self,
        _project_id: u64,
        test_case_id: u64,
        link: ExternalLink,
    ) -> Result<()> {
        self.call(format!("external_link {} {}", test_case_id, link.url))
            .await?;
        Ok(())
    }
}
