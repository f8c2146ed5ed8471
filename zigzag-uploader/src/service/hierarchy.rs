//! Module hierarchy resolution
//!
//! Maps each test case onto a module path and resolves that path against the
//! project's module tree, appending pending nodes for whatever is missing.

use tracing::debug;
use zigzag_core::{Result, ZigZagError};
use zigzag_core::domain::log::{TestCase, split_path};
use zigzag_core::domain::module::{ModuleTree, Resolution};

/// Resolves case module paths, optionally under a fixed root module
#[derive(Debug, Clone, Default)]
pub struct ModuleHierarchy {
    root: Vec<String>,
}

impl ModuleHierarchy {
    /// `root_module` may itself be a path such as `CI/nightly`
    pub fn new(root_module: Option<&str>) -> Self {
        let root = root_module
            .map(|root| split_path(root).into_iter().map(String::from).collect())
            .unwrap_or_default();
        Self { root }
    }

    /// Full module path of a case, root module first
    ///
    /// A case whose classname and name yield no module segments is filed
    /// under its suite.
    pub fn path_for(&self, suite: &str, case: &TestCase) -> Vec<String> {
        let mut segments = case.module_path();
        if segments.is_empty() {
            segments = split_path(suite);
        }

        self.root
            .iter()
            .cloned()
            .chain(segments.into_iter().map(String::from))
            .collect()
    }

    /// Resolves the module a case is filed under
    ///
    /// Fails with a required-property error when neither the case, its suite
    /// nor the root module yield a path.
    pub fn resolve(
        &self,
        tree: &mut ModuleTree,
        suite: &str,
        case: &TestCase,
    ) -> Result<Resolution> {
        let path = self.path_for(suite, case);
        let resolution = tree.resolve(&path).map_err(|e| {
            let reason = match e {
                ZigZagError::RequiredProperty(message) => message,
                other => other.to_string(),
            };
            ZigZagError::required_property(format!("{}: {}", case.qualified_name(), reason))
        })?;

        if !resolution.created.is_empty() {
            debug!(
                "{}: {} new module(s) under '{}'",
                path.join("/"),
                resolution.created.len(),
                resolution
                    .existing
                    .map(|id| tree.path_of(id))
                    .unwrap_or_default()
            );
        }

        Ok(resolution)
    }
}
