//! Link extraction
//!
//! Reads requirement and GitHub references out of test case properties and
//! turns them into normalized [`LinkRequest`]s.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use zigzag_core::domain::link::{CaseRef, LinkKind, LinkRequest};
use zigzag_core::domain::log::Properties;

use crate::config::FieldMappings;

static REQUIREMENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*-[0-9]+$").expect("Regex compilation error")
});

static GITHUB_SHORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)#([0-9]+)$").expect("Regex compilation error")
});

static GITHUB_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^https?://github\.com/",
        r"([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)/(?:issues|pull)/([0-9]+)/?$"
    ))
    .expect("Regex compilation error")
});

static GITHUB_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9]+)$").expect("Regex compilation error"));

/// Links found on one test case
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Unique links, in property order
    pub links: Vec<LinkRequest>,
    /// Values under a link key that could not be understood
    pub warnings: Vec<String>,
}

/// Extracts link requests from case properties
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    requirement_keys: Vec<String>,
    github_keys: Vec<String>,
    default_repository: Option<String>,
}

impl LinkExtractor {
    /// Creates an extractor for the given property keys
    ///
    /// `default_repository` (`owner/repo`) lets bare `#N` references resolve.
    pub fn new(mappings: &FieldMappings, default_repository: Option<String>) -> Self {
        let lower = |keys: &[String]| -> Vec<String> {
            keys.iter().map(|k| k.trim().to_lowercase()).collect()
        };
        Self {
            requirement_keys: lower(&mappings.requirement_keys),
            github_keys: lower(&mappings.github_keys),
            default_repository,
        }
    }

    pub fn extract(&self, case: &CaseRef, properties: &Properties) -> Extraction {
        let mut extraction = Extraction::default();
        let mut seen = HashSet::new();

        for (key, value) in properties {
            let key = key.trim().to_lowercase();
            let kind = if self.requirement_keys.contains(&key) {
                LinkKind::Requirement
            } else if self.github_keys.contains(&key) {
                LinkKind::Github
            } else {
                continue;
            };

            for token in value
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
            {
                let target = match kind {
                    LinkKind::Requirement => normalize_requirement(token),
                    LinkKind::Github => self.normalize_github(token),
                };

                match target {
                    Some(target) => {
                        if seen.insert((kind, target.clone())) {
                            extraction.links.push(LinkRequest {
                                case: case.clone(),
                                target,
                                kind,
                            });
                        }
                    }
                    None => extraction.warnings.push(format!(
                        "{}: ignoring malformed {} reference '{}' in property '{}'",
                        case, kind, token, key
                    )),
                }
            }
        }

        if !extraction.links.is_empty() {
            debug!("{}: {} link(s)", case, extraction.links.len());
        }

        extraction
    }

    fn normalize_github(&self, token: &str) -> Option<String> {
        if let Some(caps) = GITHUB_SHORT
            .captures(token)
            .or_else(|| GITHUB_URL.captures(token))
        {
            return Some(format!("{}/{}#{}", &caps[1], &caps[2], &caps[3]));
        }

        let caps = GITHUB_BARE.captures(token)?;
        let repository = self.default_repository.as_deref()?;
        Some(format!("{}#{}", repository, &caps[1]))
    }
}

/// Upper-cases a requirement id such as `req-42`, or `None` if malformed
fn normalize_requirement(token: &str) -> Option<String> {
    REQUIREMENT_ID
        .is_match(token)
        .then(|| token.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_ref() -> CaseRef {
        CaseRef {
            suite: 0,
            case: 1,
            qualified_name: "pkg.test_login".to_string(),
        }
    }

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn extractor() -> LinkExtractor {
        LinkExtractor::new(&FieldMappings::default(), Some("octo/widgets".to_string()))
    }

    fn targets(extraction: &Extraction) -> Vec<(&str, LinkKind)> {
        extraction
            .links
            .iter()
            .map(|l| (l.target.as_str(), l.kind))
            .collect()
    }

    #[test]
    fn test_single_requirement() {
        let extraction = extractor().extract(&case_ref(), &props(&[("req", "REQ-42")]));
        assert_eq!(targets(&extraction), vec![("REQ-42", LinkKind::Requirement)]);
        assert_eq!(extraction.links[0].case, case_ref());
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_keys_are_case_insensitive_and_values_split() {
        let extraction = extractor().extract(
            &case_ref(),
            &props(&[("JIRA", "abc-1, ABC-2 abc-1"), ("Requirement", "ABC-2")]),
        );
        assert_eq!(
            targets(&extraction),
            vec![
                ("ABC-1", LinkKind::Requirement),
                ("ABC-2", LinkKind::Requirement)
            ]
        );
    }

    #[test]
    fn test_github_forms_normalize() {
        let extraction = extractor().extract(
            &case_ref(),
            &props(&[(
                "github",
                "octo/widgets#7 https://github.com/octo/widgets/pull/8 #9 #7",
            )]),
        );
        assert_eq!(
            targets(&extraction),
            vec![
                ("octo/widgets#7", LinkKind::Github),
                ("octo/widgets#8", LinkKind::Github),
                ("octo/widgets#9", LinkKind::Github)
            ]
        );
    }

    #[test]
    fn test_bare_issue_without_repository_is_a_warning() {
        let extractor = LinkExtractor::new(&FieldMappings::default(), None);
        let extraction = extractor.extract(&case_ref(), &props(&[("issue", "#3")]));
        assert!(extraction.links.is_empty());
        assert_eq!(extraction.warnings.len(), 1);
        assert!(extraction.warnings[0].contains("'#3'"));
    }

    #[test]
    fn test_malformed_values_become_warnings() {
        let extraction = extractor().extract(&case_ref(), &props(&[("req", "REQ-1 42 REQ-")]));
        assert_eq!(targets(&extraction), vec![("REQ-1", LinkKind::Requirement)]);
        assert_eq!(extraction.warnings.len(), 2);
    }

    #[test]
    fn test_unrelated_keys_are_ignored() {
        let properties = props(&[("owner", "team-1"), ("os", "linux")]);
        let extraction = extractor().extract(&case_ref(), &properties);
        assert!(extraction.links.is_empty());
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_custom_mappings() {
        let mappings = FieldMappings {
            requirement_keys: vec!["Story".to_string()],
            github_keys: vec![],
        };
        let extraction = LinkExtractor::new(&mappings, None)
            .extract(&case_ref(), &props(&[("story", "st-5"), ("req", "REQ-1")]));
        assert_eq!(targets(&extraction), vec![("ST-5", LinkKind::Requirement)]);
    }
}
