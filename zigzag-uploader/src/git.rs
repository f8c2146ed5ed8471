//! Git context of the uploaded run
//!
//! Branch, commit and GitHub repository are taken from explicit overrides
//! first, then from the CI environment, then from the local checkout.

use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::config::GitOverrides;

/// Source-control metadata attached to a run. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitContext {
    pub branch: Option<String>,
    pub commit: Option<String>,
    /// GitHub repository as `owner/repo`
    pub repository: Option<String>,
}

impl GitContext {
    /// Resolves the context for the checkout at `workdir`
    pub fn discover(overrides: &GitOverrides, workdir: &Path) -> Self {
        Self::discover_with(overrides, |key| std::env::var(key).ok(), |args| {
            git_output(workdir, args)
        })
    }

    /// Resolves the context with injectable environment and git lookups
    pub fn discover_with(
        overrides: &GitOverrides,
        env: impl Fn(&str) -> Option<String>,
        git: impl Fn(&[&str]) -> Option<String>,
    ) -> Self {
        let from_env = |keys: &[&str]| keys.iter().find_map(|key| non_empty(env(key)));

        let branch = non_empty(overrides.branch.clone())
            .or_else(|| from_env(&["GITHUB_HEAD_REF", "GITHUB_REF_NAME", "GIT_BRANCH"]))
            .or_else(|| {
                git(&["rev-parse", "--abbrev-ref", "HEAD"]).filter(|branch| branch != "HEAD")
            });

        let commit = non_empty(overrides.commit.clone())
            .or_else(|| from_env(&["GITHUB_SHA", "GIT_COMMIT"]))
            .or_else(|| git(&["rev-parse", "HEAD"]));

        let repository = non_empty(overrides.repository.clone())
            .or_else(|| from_env(&["GITHUB_REPOSITORY"]))
            .or_else(|| {
                git(&["config", "--get", "remote.origin.url"])
                    .and_then(|url| repository_from_remote(&url))
            });

        let context = Self {
            branch,
            commit,
            repository,
        };
        debug!("Git context: {:?}", context);
        context
    }

    pub fn is_empty(&self) -> bool {
        self.branch.is_none() && self.commit.is_none() && self.repository.is_none()
    }

    /// First 12 characters of the commit
    pub fn short_commit(&self) -> Option<&str> {
        self.commit
            .as_deref()
            .map(|commit| commit.get(..12).unwrap_or(commit))
    }
}

/// Extracts `owner/repo` from a GitHub remote URL (HTTPS or SSH)
pub fn repository_from_remote(url: &str) -> Option<String> {
    let url = url.trim();
    let path = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("http://github.com/"))?;

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path.split_once('/')?;

    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }

    Some(format!("{}/{}", owner, repo))
}

fn git_output(workdir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(workdir)
        .output()
        .ok()?;

    if !output.status.success() {
        debug!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    non_empty(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
