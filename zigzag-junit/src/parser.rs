//! JUnit report parser
//!
//! Reads a report, validates it against the schema and converts it into a
//! [`TestLog`]. Parsing is all-or-nothing: a document that fails any check
//! produces no log.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;
use zigzag_core::ParsingError;
use zigzag_core::domain::log::{
    FailureDetail, Outcome, OutcomeCounts, Properties, Status, Step, TestCase, TestLog, TestSuite,
};
use zigzag_core::util::{normalize_timestamp, parse_seconds};

use crate::raw::{RawElement, read_document};
use crate::schema::{JUNIT_SCHEMA, Schema};

/// Parse a JUnit report against the built-in schema
///
/// # Arguments
/// * `bytes` - Raw XML content
/// * `source` - Label of the report (usually its path), kept on the log
///
/// # Errors
/// Returns a [`ParsingError`] naming the element and line when:
/// - The XML is malformed
/// - The document violates the schema
/// - The report contains no test suite
/// - Declared suite counts disagree with the test cases
/// - Step indices repeat within a test case
///
/// # Example
/// ```
/// use zigzag_junit::parse_test_log;
///
/// let xml = r#"<testsuite name="smoke"><testcase name="boots"/></testsuite>"#;
/// let log = parse_test_log(xml.as_bytes(), "smoke.xml")?;
/// assert_eq!(log.suites()[0].cases().len(), 1);
/// # Ok::<(), zigzag_junit::ParsingError>(())
/// ```
pub fn parse_test_log(bytes: &[u8], source: &str) -> Result<TestLog, ParsingError> {
    parse_test_log_with_schema(bytes, source, &JUNIT_SCHEMA)
}

/// Parse a JUnit report against a caller-supplied schema
pub fn parse_test_log_with_schema(
    bytes: &[u8],
    source: &str,
    schema: &Schema,
) -> Result<TestLog, ParsingError> {
    let root = read_document(bytes)?;
    schema.validate(&root)?;

    let (suite_elements, root_properties): (Vec<&RawElement>, Properties) =
        if root.name == "testsuites" {
            let properties = parse_properties(root.first_child("properties"));
            (root.children_named("testsuite").collect(), properties)
        } else {
            (vec![&root], Properties::new())
        };

    let suites = suite_elements
        .into_iter()
        .map(parse_suite)
        .collect::<Result<Vec<_>, _>>()?;

    let first_suite_timestamp = suites.iter().find_map(|suite| suite.timestamp);

    let mut log = TestLog::new(source, suites)
        .ok_or_else(|| root.error("report contains no test suite"))?;
    log.properties = root_properties;
    log.timestamp = root
        .attr("timestamp")
        .and_then(normalize_timestamp)
        .or(first_suite_timestamp);

    debug!(
        "Parsed {} suite(s), {} case(s) from {}",
        log.suites().len(),
        log.counts().total(),
        source
    );

    Ok(log)
}

fn parse_suite(element: &RawElement) -> Result<TestSuite, ParsingError> {
    let mut suite = TestSuite::new(element.attr("name").unwrap_or_default());
    suite.timestamp = element.attr("timestamp").and_then(normalize_timestamp);
    suite.time = element.attr("time").and_then(parse_seconds);
    suite.properties = parse_properties(element.first_child("properties"));

    for case in element.children_named("testcase") {
        suite.add_case(parse_case(case)?);
    }

    check_declared_counts(element, suite.counts())?;

    Ok(suite)
}

/// Declared `tests`/`failures`/`errors`/`skipped` must match the cases
fn check_declared_counts(element: &RawElement, counts: OutcomeCounts) -> Result<(), ParsingError> {
    let checks = [
        ("tests", counts.total()),
        ("failures", counts.failed),
        ("errors", counts.errors),
        ("skipped", counts.skipped),
    ];

    for (attr, actual) in checks {
        let Some(declared) = element.attr(attr).and_then(|v| v.trim().parse::<usize>().ok())
        else {
            continue;
        };
        if declared != actual {
            return Err(element.error(format!(
                "declares {}=\"{}\" but contains {}",
                attr, declared, actual
            )));
        }
    }

    Ok(())
}

fn parse_case(element: &RawElement) -> Result<TestCase, ParsingError> {
    let mut case = TestCase::new(element.attr("name").unwrap_or_default(), parse_outcome(element));
    case.classname = element.attr("classname").map(str::to_string);
    case.time = element
        .attr("time")
        .and_then(parse_seconds)
        .unwrap_or(Duration::ZERO);
    case.properties = parse_properties(element.first_child("properties"));
    case.system_out = element.first_child("system-out").and_then(RawElement::text);
    case.system_err = element.first_child("system-err").and_then(RawElement::text);

    if let Some(steps) = element.first_child("steps") {
        case.steps = parse_steps(steps)?;
    }

    Ok(case)
}

/// Derives the outcome from `failure`, `error` and `skipped` children
///
/// The first `failure` or `error` in document order wins; `skipped` only
/// counts when neither is present.
fn parse_outcome(element: &RawElement) -> Outcome {
    for child in &element.children {
        match child.name.as_str() {
            "failure" => return Outcome::Failed(failure_detail(child)),
            "error" => return Outcome::Error(failure_detail(child)),
            _ => {}
        }
    }

    match element.first_child("skipped") {
        Some(skipped) => Outcome::Skipped {
            message: skipped.attr("message").map(str::to_string).or(skipped.text()),
        },
        None => Outcome::Passed,
    }
}

fn failure_detail(element: &RawElement) -> FailureDetail {
    FailureDetail {
        message: element.attr("message").map(str::to_string),
        kind: element.attr("type").map(str::to_string),
        text: element.text(),
    }
}

fn parse_steps(element: &RawElement) -> Result<Vec<Step>, ParsingError> {
    let mut seen = HashSet::new();
    let mut steps = Vec::new();

    for step in element.children_named("step") {
        let index = step
            .attr("index")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .ok_or_else(|| step.error("attribute 'index' must be a non-negative integer"))?;

        if !seen.insert(index) {
            return Err(step.error(format!("duplicate step index {}", index)));
        }

        let mut outcome = parse_outcome(step);
        if outcome == Outcome::Passed {
            outcome = match step.attr("status").and_then(|s| Status::parse(s.trim())) {
                Some(Status::Failed) => Outcome::Failed(FailureDetail::default()),
                Some(Status::Error) => Outcome::Error(FailureDetail::default()),
                Some(Status::Skipped) => Outcome::Skipped { message: None },
                Some(Status::Passed) | None => Outcome::Passed,
            };
        }

        steps.push(Step {
            index,
            description: step.attr("name").unwrap_or_default().to_string(),
            outcome,
        });
    }

    steps.sort_by_key(|step| step.index);
    Ok(steps)
}

/// Collects `<property>` entries; a repeated name merges its values with ", "
fn parse_properties(element: Option<&RawElement>) -> Properties {
    let mut properties = Properties::new();

    let Some(element) = element else {
        return properties;
    };

    for property in element.children_named("property") {
        let Some(name) = property.attr("name") else {
            continue;
        };
        let value = property
            .attr("value")
            .map(str::to_string)
            .unwrap_or_else(|| property.text.clone());

        properties
            .entry(name.to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites timestamp="2024-05-02T08:00:00">
  <properties>
    <property name="BUILD_URL" value="https://ci.example.com/job/42"/>
  </properties>
  <testsuite name="auth" tests="3" failures="1" errors="0" skipped="1" time="1.25">
    <testcase name="test_login" classname="tests.auth.test_session" time="0.5">
      <properties>
        <property name="req" value="REQ-42"/>
        <property name="req" value="REQ-43"/>
      </properties>
    </testcase>
    <testcase name="test_logout" classname="tests.auth.test_session" time="0.75">
      <failure message="expected 200" type="AssertionError">Traceback
  line 12</failure>
      <system-out>logging out</system-out>
      <steps>
        <step index="2" name="click logout"><failure message="no response"/></step>
        <step index="1" name="open profile"/>
      </steps>
    </testcase>
    <testcase name="test_sso" classname="tests.auth.test_sso">
      <skipped message="no idp"/>
    </testcase>
  </testsuite>
</testsuites>"#;

    #[test]
    fn test_parse_full_report() {
        let log = parse_test_log(REPORT.as_bytes(), "report.xml").unwrap();

        assert_eq!(log.source, "report.xml");
        assert!(log.timestamp.is_some());
        assert_eq!(
            log.properties.get("BUILD_URL").map(String::as_str),
            Some("https://ci.example.com/job/42")
        );

        let suite = &log.suites()[0];
        assert_eq!(suite.name, "auth");
        assert_eq!(suite.time, Some(Duration::from_millis(1250)));

        let cases = suite.cases();
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].outcome, Outcome::Passed);
        assert_eq!(
            cases[0].properties.get("req").map(String::as_str),
            Some("REQ-42, REQ-43")
        );

        let failure = cases[1].outcome.failure().unwrap();
        assert_eq!(failure.message.as_deref(), Some("expected 200"));
        assert_eq!(failure.kind.as_deref(), Some("AssertionError"));
        assert_eq!(cases[1].system_out.as_deref(), Some("logging out"));
        assert_eq!(cases[1].time, Duration::from_millis(750));

        assert_eq!(
            cases[2].outcome,
            Outcome::Skipped {
                message: Some("no idp".to_string())
            }
        );
    }

    #[test]
    fn test_steps_are_ordered_by_index() {
        let log = parse_test_log(REPORT.as_bytes(), "report.xml").unwrap();
        let steps = &log.suites()[0].cases()[1].steps;

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].index, 1);
        assert_eq!(steps[0].description, "open profile");
        assert_eq!(steps[0].outcome, Outcome::Passed);
        assert_eq!(steps[1].outcome.status(), Status::Failed);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let first = parse_test_log(REPORT.as_bytes(), "report.xml").unwrap();
        let second = parse_test_log(REPORT.as_bytes(), "report.xml").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_suite_counts_match_cases() {
        let log = parse_test_log(REPORT.as_bytes(), "report.xml").unwrap();
        for suite in log.suites() {
            let mut expected = OutcomeCounts::default();
            for case in suite.cases() {
                expected.record(case.outcome.status());
            }
            assert_eq!(suite.counts(), expected);
        }
    }

    #[test]
    fn test_failure_detail_invariant_holds() {
        let log = parse_test_log(REPORT.as_bytes(), "report.xml").unwrap();
        for (_, _, case) in log.cases() {
            match case.outcome.status() {
                Status::Failed | Status::Error => assert!(case.outcome.failure().is_some()),
                Status::Passed | Status::Skipped => assert!(case.outcome.failure().is_none()),
            }
        }
    }

    #[test]
    fn test_single_testsuite_root() {
        let xml = r#"<testsuite name="solo"><testcase name="a"/></testsuite>"#;
        let log = parse_test_log(xml.as_bytes(), "solo.xml").unwrap();
        assert_eq!(log.suites().len(), 1);
        assert_eq!(log.suites()[0].name, "solo");
    }

    #[test]
    fn test_empty_testsuites_is_rejected() {
        let err = parse_test_log(b"<testsuites/>", "empty.xml").unwrap_err();
        assert_eq!(err.element, "testsuites");
        assert!(err.message.contains("no test suite"));
    }

    #[test]
    fn test_count_mismatch_is_rejected() {
        let xml = r#"<testsuite name="s" failures="2"><testcase name="a"/></testsuite>"#;
        let err = parse_test_log(xml.as_bytes(), "bad.xml").unwrap_err();
        assert!(err.message.contains("failures"));
    }

    #[test]
    fn test_oversized_time_is_rejected() {
        let xml = r#"<testsuite name="s"><testcase name="a" time="1e20"/></testsuite>"#;
        let err = parse_test_log(xml.as_bytes(), "bad.xml").unwrap_err();
        assert_eq!(err.element, "testcase");
        assert!(err.message.contains("'time'"));
        assert!(err.message.contains("non-negative number of seconds"));
    }

    #[test]
    fn test_large_report() {
        let mut xml = String::from("<testsuites>\n<testsuite name=\"big\">\n");
        for i in 0..40_000 {
            xml.push_str(&format!(
                "  <testcase classname=\"pkg.Mod{}\" name=\"test_{}\" time=\"0.01\"/>\n",
                i % 50,
                i
            ));
        }
        xml.push_str("</testsuite>\n</testsuites>\n");

        let log = parse_test_log(xml.as_bytes(), "big.xml").unwrap();
        assert_eq!(log.counts().total(), 40_000);
        assert_eq!(log.counts().passed, 40_000);
    }

    #[test]
    fn test_duplicate_step_index_is_rejected() {
        let xml = r#"<testsuite name="s"><testcase name="a"><steps>
            <step index="1" name="x"/>
            <step index="1" name="y"/>
        </steps></testcase></testsuite>"#;
        let err = parse_test_log(xml.as_bytes(), "bad.xml").unwrap_err();
        assert_eq!(err.element, "step");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_error_takes_first_outcome_element() {
        let xml = r#"<testsuite name="s"><testcase name="a">
            <error message="setup crashed"/>
            <failure message="later"/>
        </testcase></testsuite>"#;
        let log = parse_test_log(xml.as_bytes(), "x.xml").unwrap();
        let case = &log.suites()[0].cases()[0];
        assert_eq!(case.outcome.status(), Status::Error);
        assert_eq!(
            case.outcome.failure().unwrap().message.as_deref(),
            Some("setup crashed")
        );
    }

    #[test]
    fn test_step_status_attribute() {
        let xml = r#"<testsuite name="s"><testcase name="a"><steps>
            <step index="0" name="x" status="skipped"/>
        </steps></testcase></testsuite>"#;
        let log = parse_test_log(xml.as_bytes(), "x.xml").unwrap();
        let step = &log.suites()[0].cases()[0].steps[0];
        assert_eq!(step.outcome, Outcome::Skipped { message: None });
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        assert!(parse_test_log(b"<testsuite name=\"s\">", "x.xml").is_err());
    }
}
