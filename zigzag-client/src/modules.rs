//! Module-related API endpoints

use reqwest::Method;
use tracing::debug;
use zigzag_core::dto::module::{CreateModule, RemoteModule};

use crate::QTestClient;
use crate::error::Result;

impl QTestClient {
    // =============================================================================
    // Module Tree
    // =============================================================================

    /// List the modules of a project with all their descendants
    ///
    /// # Arguments
    /// * `project_id` - The qTest project id
    ///
    /// # Returns
    /// The top-level modules, each carrying its children
    pub async fn get_module_tree(&self, project_id: u64) -> Result<Vec<RemoteModule>> {
        let url = self.project_url(project_id, "modules?expand=descendants");
        let response = self.request(Method::GET, &url).send().await?;

        self.handle_response(response).await
    }

    /// Create a module
    ///
    /// # Arguments
    /// * `project_id` - The qTest project id
    /// * `parent_id` - Parent module, or `None` for the project root
    /// * `req` - The module creation request
    ///
    /// # Returns
    /// The created module
    pub async fn post_module(
        &self,
        project_id: u64,
        parent_id: Option<u64>,
        req: CreateModule,
    ) -> Result<RemoteModule> {
        let path = match parent_id {
            Some(parent_id) => format!("modules?parentId={}", parent_id),
            None => "modules".to_string(),
        };
        let url = self.project_url(project_id, &path);
        debug!("Creating module '{}' (parent: {:?})", req.name, parent_id);

        let response = self.request(Method::POST, &url).json(&req).send().await?;

        self.handle_response(response).await
    }
}
