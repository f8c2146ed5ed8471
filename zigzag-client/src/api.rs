//! The remote operations the uploader needs

use async_trait::async_trait;
use zigzag_core::dto::link::{ExternalLink, Requirement};
use zigzag_core::dto::module::{CreateModule, RemoteModule};
use zigzag_core::dto::result::{SubmitTestResult, SubmittedResult};
use zigzag_core::dto::run::{CreateTestRun, TestRun};

use crate::QTestClient;
use crate::error::Result;

/// Operations against a qTest project
///
/// Each call is a single request/response pair. Callers decide whether an
/// error is worth retrying through [`ClientError::is_retryable`](crate::ClientError::is_retryable).
#[async_trait]
pub trait QTestApi: Send + Sync {
    /// Fetch the module tree of a project, descendants included
    async fn list_modules(&self, project_id: u64) -> Result<Vec<RemoteModule>>;

    /// Create a module under `parent_id`, or at the project root when `None`
    async fn create_module(
        &self,
        project_id: u64,
        parent_id: Option<u64>,
        req: CreateModule,
    ) -> Result<RemoteModule>;

    /// Create the test run that receives an upload's results
    async fn create_test_run(&self, project_id: u64, req: CreateTestRun) -> Result<TestRun>;

    /// Record one test case result in a run
    async fn submit_test_result(
        &self,
        project_id: u64,
        run_id: u64,
        req: SubmitTestResult,
    ) -> Result<SubmittedResult>;

    /// Look up a requirement by its identifier, e.g. `REQ-42`
    async fn find_requirement(&self, project_id: u64, identifier: &str)
    -> Result<Option<Requirement>>;

    /// Link a requirement to a test case
    async fn link_requirement(
        &self,
        project_id: u64,
        requirement_id: u64,
        test_case_id: u64,
    ) -> Result<()>;

    /// Attach an external reference (GitHub issue or pull request) to a test case
    async fn attach_external_link(
        &self,
        project_id: u64,
        test_case_id: u64,
        link: ExternalLink,
    ) -> Result<()>;
}

#[async_trait]
impl QTestApi for QTestClient {
    async fn list_modules(&self, project_id: u64) -> Result<Vec<RemoteModule>> {
        self.get_module_tree(project_id).await
    }

    async fn create_module(
        &self,
        project_id: u64,
        parent_id: Option<u64>,
        req: CreateModule,
    ) -> Result<RemoteModule> {
        self.post_module(project_id, parent_id, req).await
    }

    async fn create_test_run(&self, project_id: u64, req: CreateTestRun) -> Result<TestRun> {
        self.post_test_run(project_id, req).await
    }

    async fn submit_test_result(
        &self,
        project_id: u64,
        run_id: u64,
        req: SubmitTestResult,
    ) -> Result<SubmittedResult> {
        self.post_test_result(project_id, run_id, req).await
    }

    async fn find_requirement(
        &self,
        project_id: u64,
        identifier: &str,
    ) -> Result<Option<Requirement>> {
        self.search_requirement(project_id, identifier).await
    }

    async fn link_requirement(
        &self,
        project_id: u64,
        requirement_id: u64,
        test_case_id: u64,
    ) -> Result<()> {
        self.post_requirement_link(project_id, requirement_id, test_case_id)
            .await
    }

    async fn attach_external_link(
        &self,
        project_id: u64,
        test_case_id: u64,
        link: ExternalLink,
    ) -> Result<()> {
        self.post_external_link(project_id, test_case_id, link).await
    }
}
