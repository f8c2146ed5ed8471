//! Test run and result API endpoints

use reqwest::Method;
use zigzag_core::dto::result::{SubmitTestResult, SubmittedResult};
use zigzag_core::dto::run::{CreateTestRun, TestRun};

use crate::QTestClient;
use crate::error::Result;

impl QTestClient {
    // =============================================================================
    // Test Runs
    // =============================================================================

    /// Create a test run at the root of the project's execution tree
    ///
    /// qTest stores the results of one upload in a test cycle, which is what
    /// this creates.
    ///
    /// # Arguments
    /// * `project_id` - The qTest project id
    /// * `req` - Name, description and tags of the run
    ///
    /// # Returns
    /// The created run
    pub async fn post_test_run(&self, project_id: u64, req: CreateTestRun) -> Result<TestRun> {
        let url = self.project_url(project_id, "test-cycles?parentId=0&parentType=root");
        let response = self.request(Method::POST, &url).json(&req).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Test Results
    // =============================================================================

    /// Submit the result of one automated test case into a run
    ///
    /// The remote side creates the test case inside the given module when no
    /// test case with the same automation content exists yet.
    ///
    /// # Arguments
    /// * `project_id` - The qTest project id
    /// * `run_id` - Run created by [`post_test_run`](Self::post_test_run)
    /// * `req` - The result payload
    pub async fn post_test_result(
        &self,
        project_id: u64,
        run_id: u64,
        req: SubmitTestResult,
    ) -> Result<SubmittedResult> {
        let url = self.project_url(
            project_id,
            &format!("auto-test-logs?parentId={}&parentType=test-cycle", run_id),
        );
        let response = self.request(Method::POST, &url).json(&req).send().await?;

        self.handle_response(response).await
    }
}
