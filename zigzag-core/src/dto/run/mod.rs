//! Test run DTOs

use serde::{Deserialize, Serialize};

/// Request to create the test run holding an upload's results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTestRun {
    pub name: String,
    pub description: String,
    /// Free-form key/value tags (branch, commit, source file)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<RunProperty>,
}

/// One tag attached to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProperty {
    pub name: String,
    pub value: String,
}

/// Test run returned by the remote API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub id: u64,
    pub name: String,
}
