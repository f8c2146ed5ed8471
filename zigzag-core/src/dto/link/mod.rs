//! Link DTOs

use serde::{Deserialize, Serialize};

/// Requirement record found by identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub id: u64,
    pub name: String,
}

/// Search request for requirements matching an identifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementQuery {
    pub object_type: String,
    pub fields: Vec<String>,
    pub query: String,
}

impl RequirementQuery {
    pub fn by_identifier(identifier: &str) -> Self {
        Self {
            object_type: "requirements".to_string(),
            fields: vec!["id".to_string(), "name".to_string()],
            query: format!("'name' ~ '{}'", identifier.replace('\'', "")),
        }
    }
}

/// Search response page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// External reference attached to a test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub url: String,
    pub label: String,
}
