//! Test log domain types
//!
//! The in-memory form of one parsed JUnit report: ordered suites, each holding
//! ordered test cases with their outcome, timing, steps and properties.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Property map attached to suites and cases (keys are unique)
pub type Properties = BTreeMap<String, String>;

/// Root of one parsed run
///
/// Built once by the XML parser and never mutated afterwards. A log always
/// contains at least one suite; an empty report is rejected while parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct TestLog {
    /// Path or label of the file this log was read from
    pub source: String,
    /// Run-level timestamp, normalized to UTC
    pub timestamp: Option<DateTime<Utc>>,
    /// Properties declared on the `<testsuites>` root
    pub properties: Properties,
    suites: Vec<TestSuite>,
}

impl TestLog {
    /// Creates a log from its suites
    ///
    /// Returns `None` when `suites` is empty.
    pub fn new(source: impl Into<String>, suites: Vec<TestSuite>) -> Option<Self> {
        if suites.is_empty() {
            return None;
        }

        Some(Self {
            source: source.into(),
            timestamp: None,
            properties: Properties::new(),
            suites,
        })
    }

    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    /// Iterates over every case in execution order with its suite and case index
    pub fn cases(&self) -> impl Iterator<Item = (usize, usize, &TestCase)> {
        self.suites.iter().enumerate().flat_map(|(suite_idx, suite)| {
            suite
                .cases()
                .iter()
                .enumerate()
                .map(move |(case_idx, case)| (suite_idx, case_idx, case))
        })
    }

    /// Sums the counts of every suite
    pub fn counts(&self) -> OutcomeCounts {
        self.suites
            .iter()
            .fold(OutcomeCounts::default(), |acc, suite| acc + suite.counts())
    }
}

/// A named group of test cases
#[derive(Debug, Clone, PartialEq)]
pub struct TestSuite {
    pub name: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub time: Option<Duration>,
    pub properties: Properties,
    cases: Vec<TestCase>,
    counts: OutcomeCounts,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: None,
            time: None,
            properties: Properties::new(),
            cases: Vec::new(),
            counts: OutcomeCounts::default(),
        }
    }

    /// Appends a case and updates the aggregate counts
    pub fn add_case(&mut self, case: TestCase) -> &mut Self {
        self.counts.record(case.outcome.status());
        self.cases.push(case);
        self
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }
}

/// Outcome status without the attached detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Error,
    Skipped,
}

impl Status {
    /// Parses the lowercase status name used in reports and remote payloads
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "error" => Some(Self::Error),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Error => "error",
            Status::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message and stack text of a failure or error
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FailureDetail {
    pub message: Option<String>,
    pub kind: Option<String>,
    pub text: Option<String>,
}

impl FailureDetail {
    /// One-line description, preferring the message over the stack text
    pub fn summary(&self) -> String {
        self.message
            .as_deref()
            .or(self.text.as_deref().and_then(|t| t.lines().next()))
            .unwrap_or("no failure message")
            .to_string()
    }
}

/// Outcome of a test case or step
///
/// Failure detail only exists on `Failed` and `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(FailureDetail),
    Error(FailureDetail),
    Skipped { message: Option<String> },
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Passed => Status::Passed,
            Outcome::Failed(_) => Status::Failed,
            Outcome::Error(_) => Status::Error,
            Outcome::Skipped { .. } => Status::Skipped,
        }
    }

    pub fn failure(&self) -> Option<&FailureDetail> {
        match self {
            Outcome::Failed(detail) | Outcome::Error(detail) => Some(detail),
            Outcome::Passed | Outcome::Skipped { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Passed | Outcome::Skipped { .. })
    }
}

/// A single test case
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub classname: Option<String>,
    pub outcome: Outcome,
    pub time: Duration,
    pub steps: Vec<Step>,
    pub properties: Properties,
    pub system_out: Option<String>,
    pub system_err: Option<String>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            classname: None,
            outcome,
            time: Duration::ZERO,
            steps: Vec::new(),
            properties: Properties::new(),
            system_out: None,
            system_err: None,
        }
    }

    /// `classname.name`, or just the name when there is no classname
    pub fn qualified_name(&self) -> String {
        match self.classname.as_deref().filter(|c| !c.is_empty()) {
            Some(classname) => format!("{}.{}", classname, self.name),
            None => self.name.clone(),
        }
    }

    /// Module path segments the case is filed under
    ///
    /// Taken from the classname when present; otherwise the name without its
    /// final segment. Segments are separated by `.` or `/`.
    pub fn module_path(&self) -> Vec<&str> {
        match self.classname.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(classname) => split_path(classname),
            None => {
                let mut segments = split_path(&self.name);
                segments.pop();
                segments
            }
        }
    }
}

/// Splits a qualified path on `.` and `/`, dropping empty segments
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(['.', '/'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// One ordered step of a test case
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub index: u32,
    pub description: String,
    pub outcome: Outcome,
}

/// Pass/fail/error/skip tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Passed => self.passed += 1,
            Status::Failed => self.failed += 1,
            Status::Error => self.errors += 1,
            Status::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errors + self.skipped
    }
}

impl std::ops::Add for OutcomeCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            passed: self.passed + rhs.passed,
            failed: self.failed + rhs.failed,
            errors: self.errors + rhs.errors,
            skipped: self.skipped + rhs.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(message: &str) -> Outcome {
        Outcome::Failed(FailureDetail {
            message: Some(message.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_suite_counts_follow_added_cases() {
        let mut suite = TestSuite::new("suite");
        suite
            .add_case(TestCase::new("a", Outcome::Passed))
            .add_case(TestCase::new("b", failed("boom")))
            .add_case(TestCase::new("c", Outcome::Error(FailureDetail::default())))
            .add_case(TestCase::new("d", Outcome::Skipped { message: None }))
            .add_case(TestCase::new("e", Outcome::Passed));

        let counts = suite.counts();
        assert_eq!(counts.passed, 2);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.errors, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.total(), suite.cases().len());
    }

    #[test]
    fn test_failure_detail_only_on_failed_and_error() {
        assert!(Outcome::Passed.failure().is_none());
        assert!(Outcome::Skipped { message: None }.failure().is_none());
        assert!(failed("x").failure().is_some());
        assert!(Outcome::Error(FailureDetail::default()).failure().is_some());
    }

    #[test]
    fn test_empty_log_is_rejected() {
        assert!(TestLog::new("empty.xml", vec![]).is_none());
    }

    #[test]
    fn test_module_path_from_classname() {
        let mut case = TestCase::new("test_login", Outcome::Passed);
        case.classname = Some("tests.auth/test_session".to_string());

        assert_eq!(case.module_path(), vec!["tests", "auth", "test_session"]);
        assert_eq!(case.qualified_name(), "tests.auth/test_session.test_login");
    }

    #[test]
    fn test_module_path_without_classname() {
        let case = TestCase::new("api/users/test_create", Outcome::Passed);
        assert_eq!(case.module_path(), vec!["api", "users"]);
    }

    #[test]
    fn test_failure_summary_falls_back_to_text() {
        let detail = FailureDetail {
            message: None,
            kind: None,
            text: Some("assertion failed\n  at line 3".to_string()),
        };
        assert_eq!(detail.summary(), "assertion failed");
    }
}
