//! Link request domain types

use serde::{Deserialize, Serialize};

/// Reference to a test case inside a [`TestLog`](crate::domain::log::TestLog)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseRef {
    pub suite: usize,
    pub case: usize,
    pub qualified_name: String,
}

impl std::fmt::Display for CaseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified_name)
    }
}

/// What a link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Requirement,
    Github,
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkKind::Requirement => write!(f, "requirement"),
            LinkKind::Github => write!(f, "github"),
        }
    }
}

/// Pending association between a test case and a requirement or GitHub reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRequest {
    pub case: CaseRef,
    /// Normalized identifier (`REQ-42`, `owner/repo#7`)
    pub target: String,
    pub kind: LinkKind,
}

impl LinkRequest {
    /// Web URL for GitHub references, `None` for requirements
    pub fn github_url(&self) -> Option<String> {
        if self.kind != LinkKind::Github {
            return None;
        }
        let (repo, number) = self.target.split_once('#')?;
        Some(format!("https://github.com/{}/issues/{}", repo, number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_ref() -> CaseRef {
        CaseRef {
            suite: 0,
            case: 0,
            qualified_name: "a.b".to_string(),
        }
    }

    #[test]
    fn test_github_url() {
        let link = LinkRequest {
            case: case_ref(),
            target: "octo/repo#12".to_string(),
            kind: LinkKind::Github,
        };
        assert_eq!(
            link.github_url().as_deref(),
            Some("https://github.com/octo/repo/issues/12")
        );
    }

    #[test]
    fn test_requirement_has_no_url() {
        let link = LinkRequest {
            case: case_ref(),
            target: "REQ-1".to_string(),
            kind: LinkKind::Requirement,
        };
        assert!(link.github_url().is_none());
    }
}
