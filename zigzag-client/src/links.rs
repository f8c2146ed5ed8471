//! Requirement and external link API endpoints

use reqwest::Method;
use zigzag_core::dto::link::{ExternalLink, Requirement, RequirementQuery, SearchPage};

use crate::QTestClient;
use crate::error::Result;

impl QTestClient {
    // =============================================================================
    // Requirements
    // =============================================================================

    /// Find a requirement by identifier
    ///
    /// The search matches names containing the identifier; only a name equal
    /// to it, or starting with it followed by a space or colon, is accepted.
    ///
    /// # Returns
    /// The requirement, or `None` if no name matches
    pub async fn search_requirement(
        &self,
        project_id: u64,
        identifier: &str,
    ) -> Result<Option<Requirement>> {
        let url = self.project_url(project_id, "search");
        let response = self
            .request(Method::POST, &url)
            .json(&RequirementQuery::by_identifier(identifier))
            .send()
            .await?;

        let page: SearchPage<Requirement> = self.handle_response(response).await?;

        Ok(page
            .items
            .into_iter()
            .find(|req| names_requirement(&req.name, identifier)))
    }

    /// Link a requirement to a test case
    pub async fn post_requirement_link(
        &self,
        project_id: u64,
        requirement_id: u64,
        test_case_id: u64,
    ) -> Result<()> {
        let url = self.project_url(
            project_id,
            &format!("requirements/{}/link?type=test-cases", requirement_id),
        );
        let response = self
            .request(Method::POST, &url)
            .json(&[test_case_id])
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // External References
    // =============================================================================

    /// Attach an external link to a test case
    pub async fn post_external_link(
        &self,
        project_id: u64,
        test_case_id: u64,
        link: ExternalLink,
    ) -> Result<()> {
        let url = self.project_url(
            project_id,
            &format!("test-cases/{}/external-links", test_case_id),
        );
        let response = self.request(Method::POST, &url).json(&link).send().await?;

        self.handle_empty_response(response).await
    }
}

/// Whether a requirement name belongs to `identifier`
fn names_requirement(name: &str, identifier: &str) -> bool {
    let name = name.trim();
    match name.strip_prefix(identifier) {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', ':']),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_requirement() {
        assert!(names_requirement("REQ-42", "REQ-42"));
        assert!(names_requirement("REQ-42 Login must lock after 3 tries", "REQ-42"));
        assert!(names_requirement("REQ-42: Login", "REQ-42"));
        assert!(!names_requirement("REQ-421 Other", "REQ-42"));
        assert!(!names_requirement("See REQ-42", "REQ-42"));
    }
}
