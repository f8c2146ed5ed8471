//! JUnit schema
//!
//! The fixed structure every report must follow. Each element lists the child
//! elements it may contain, the attributes it must carry and the types of the
//! attributes whose values are checked. Attributes not mentioned are ignored;
//! elements not mentioned are rejected.

use zigzag_core::ParsingError;
use zigzag_core::domain::log::Status;
use zigzag_core::util::{normalize_timestamp, parse_seconds};

use crate::raw::RawElement;

/// Value type of a checked attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    /// Non-negative decimal seconds
    Seconds,
    /// Non-negative integer
    Count,
    /// ISO 8601 timestamp
    Timestamp,
    /// One of `passed`, `failed`, `error`, `skipped`
    Status,
}

impl AttrType {
    fn check(&self, value: &str) -> bool {
        match self {
            AttrType::Seconds => parse_seconds(value).is_some(),
            AttrType::Count => value.trim().parse::<u64>().is_ok(),
            AttrType::Timestamp => normalize_timestamp(value).is_some(),
            AttrType::Status => Status::parse(value.trim()).is_some(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            AttrType::Seconds => "a non-negative number of seconds",
            AttrType::Count => "a non-negative integer",
            AttrType::Timestamp => "an ISO 8601 timestamp",
            AttrType::Status => "one of passed, failed, error, skipped",
        }
    }
}

/// Rules for one element
#[derive(Debug)]
pub struct ElementRule {
    pub name: &'static str,
    pub children: &'static [&'static str],
    pub required: &'static [&'static str],
    pub typed: &'static [(&'static str, AttrType)],
}

/// A set of element rules plus the allowed root elements
#[derive(Debug)]
pub struct Schema {
    pub roots: &'static [&'static str],
    pub elements: &'static [ElementRule],
}

const SUITE_COUNTS: &[(&str, AttrType)] = &[
    ("tests", AttrType::Count),
    ("failures", AttrType::Count),
    ("errors", AttrType::Count),
    ("skipped", AttrType::Count),
    ("disabled", AttrType::Count),
    ("time", AttrType::Seconds),
    ("timestamp", AttrType::Timestamp),
];

const OUTCOME_ELEMENTS: &[&str] = &["failure", "error", "skipped"];

/// Schema shipped with ZigZag
pub static JUNIT_SCHEMA: Schema = Schema {
    roots: &["testsuites", "testsuite"],
    elements: &[
        ElementRule {
            name: "testsuites",
            children: &["testsuite", "properties"],
            required: &[],
            typed: SUITE_COUNTS,
        },
        ElementRule {
            name: "testsuite",
            children: &["properties", "testcase", "system-out", "system-err"],
            required: &["name"],
            typed: SUITE_COUNTS,
        },
        ElementRule {
            name: "properties",
            children: &["property"],
            required: &[],
            typed: &[],
        },
        ElementRule {
            name: "property",
            children: &[],
            required: &["name"],
            typed: &[],
        },
        ElementRule {
            name: "testcase",
            children: &[
                "failure",
                "error",
                "skipped",
                "system-out",
                "system-err",
                "properties",
                "steps",
            ],
            required: &["name"],
            typed: &[("time", AttrType::Seconds), ("assertions", AttrType::Count)],
        },
        ElementRule {
            name: "failure",
            children: &[],
            required: &[],
            typed: &[],
        },
        ElementRule {
            name: "error",
            children: &[],
            required: &[],
            typed: &[],
        },
        ElementRule {
            name: "skipped",
            children: &[],
            required: &[],
            typed: &[],
        },
        ElementRule {
            name: "system-out",
            children: &[],
            required: &[],
            typed: &[],
        },
        ElementRule {
            name: "system-err",
            children: &[],
            required: &[],
            typed: &[],
        },
        ElementRule {
            name: "steps",
            children: &["step"],
            required: &[],
            typed: &[],
        },
        ElementRule {
            name: "step",
            children: OUTCOME_ELEMENTS,
            required: &["index", "name"],
            typed: &[("index", AttrType::Count), ("status", AttrType::Status)],
        },
    ],
};

impl Schema {
    fn rule(&self, name: &str) -> Option<&ElementRule> {
        self.elements.iter().find(|rule| rule.name == name)
    }

    /// Validates a whole document, stopping at the first violation
    pub fn validate(&self, root: &RawElement) -> Result<(), ParsingError> {
        if !self.roots.contains(&root.name.as_str()) {
            return Err(root.error(format!(
                "root element must be one of: {}",
                self.roots.join(", ")
            )));
        }
        self.validate_element(root)
    }

    fn validate_element(&self, element: &RawElement) -> Result<(), ParsingError> {
        let rule = self
            .rule(&element.name)
            .ok_or_else(|| element.error("unknown element"))?;

        for required in rule.required {
            if element.attr(required).is_none() {
                return Err(element.error(format!("missing required attribute '{}'", required)));
            }
        }

        for (name, attr_type) in rule.typed {
            if let Some(value) = element.attr(name) {
                if !attr_type.check(value) {
                    return Err(element.error(format!(
                        "attribute '{}' must be {}, got '{}'",
                        name,
                        attr_type.describe(),
                        value
                    )));
                }
            }
        }

        for child in &element.children {
            if !rule.children.contains(&child.name.as_str()) {
                return Err(child.error(format!("not allowed inside <{}>", element.name)));
            }
            self.validate_element(child)?;
        }

        Ok(())
    }
}
