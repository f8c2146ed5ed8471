//! Test result DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::log::Status;

/// Result of one test case, as submitted to a test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitTestResult {
    pub name: String,
    /// Fully qualified name used by qTest to match automated test cases
    pub automation_content: String,
    pub status: Status,
    pub exe_start_date: DateTime<Utc>,
    pub exe_end_date: DateTime<Utc>,
    /// Module the test case is filed under; filled in at dispatch time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_step_logs: Vec<TestStepLog>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<crate::dto::run::RunProperty>,
}

impl Default for SubmitTestResult {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            name: String::new(),
            automation_content: String::new(),
            status: Status::Passed,
            exe_start_date: now,
            exe_end_date: now,
            module_id: None,
            note: None,
            test_step_logs: Vec::new(),
            properties: Vec::new(),
        }
    }
}

/// Outcome of one step of a test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStepLog {
    pub order: u32,
    pub description: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_result: Option<String>,
}

/// Response to a result submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedResult {
    /// Id of the created test log
    pub id: u64,
    /// Id of the test case the result was recorded against
    pub test_case_id: u64,
}
