//! Uploader configuration
//!
//! Settings come from an optional TOML file, then environment variables, then
//! command-line overrides applied by the caller. [`Config`] is the raw,
//! partially filled form; [`Settings`] is the validated form the orchestrator
//! runs with.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use zigzag_core::{Result, ZigZagError};

use crate::scheduler::retry::{
    DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY, RetryPolicy,
};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "zigzag.toml";

/// Parallel upload requests allowed by default
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Raw configuration as read from file and environment
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// qTest base URL (e.g., "https://example.qtestnet.com")
    pub base_url: Option<String>,

    /// API token sent as a bearer token
    pub api_token: Option<String>,

    /// Target project
    pub project_id: Option<u64>,

    /// Module every uploaded case is filed under
    pub root_module: Option<String>,

    /// Base name of the created test run
    pub run_name: Option<String>,

    /// Max parallel upload requests
    pub concurrency: usize,

    /// Attempts per job, the first one included
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_backoff_ms: u64,

    /// Upper bound for retry delays
    pub max_backoff_ms: u64,

    /// Timeout of a single HTTP request
    pub request_timeout_secs: u64,

    /// Which case properties carry link identifiers
    pub field_mappings: FieldMappings,

    /// Values that take precedence over the detected git context
    pub git: GitOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            project_id: None,
            root_module: None,
            run_name: None,
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
            max_backoff_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
            request_timeout_secs: 30,
            field_mappings: FieldMappings::default(),
            git: GitOverrides::default(),
        }
    }
}

/// Property keys recognized as link tags (matched case-insensitively)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldMappings {
    pub requirement_keys: Vec<String>,
    pub github_keys: Vec<String>,
}

impl Default for FieldMappings {
    fn default() -> Self {
        Self {
            requirement_keys: ["req", "requirement", "requirements", "jira"]
                .map(String::from)
                .to_vec(),
            github_keys: ["github", "gh", "issue"].map(String::from).to_vec(),
        }
    }
}

/// Explicit git metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitOverrides {
    pub branch: Option<String>,
    pub commit: Option<String>,
    /// GitHub repository as `owner/repo`
    pub repository: Option<String>,
}

impl Config {
    /// Reads a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ZigZagError::config(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_toml(&content)
            .map_err(|e| ZigZagError::config(format!("invalid {}: {}", path.display(), e)))
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads the configuration file and applies environment overrides
    ///
    /// An explicit `path` must exist. Without one, `zigzag.toml` in the
    /// working directory is used when present, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("No configuration file, using defaults");
                Self::default()
            }
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Applies overrides from the process environment
    ///
    /// Recognized variables:
    /// - ZIGZAG_BASE_URL
    /// - ZIGZAG_API_TOKEN
    /// - ZIGZAG_PROJECT_ID
    /// - ZIGZAG_ROOT_MODULE
    /// - ZIGZAG_CONCURRENCY
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("ZIGZAG_BASE_URL") {
            self.base_url = Some(url);
        }

        if let Some(token) = lookup("ZIGZAG_API_TOKEN") {
            self.api_token = Some(token);
        }

        if let Some(project_id) = lookup("ZIGZAG_PROJECT_ID") {
            let project_id = project_id.trim().parse::<u64>().map_err(|_| {
                ZigZagError::config(format!(
                    "ZIGZAG_PROJECT_ID must be a number, got '{}'",
                    project_id
                ))
            })?;
            self.project_id = Some(project_id);
        }

        if let Some(root_module) = lookup("ZIGZAG_ROOT_MODULE") {
            self.root_module = Some(root_module);
        }

        if let Some(concurrency) = lookup("ZIGZAG_CONCURRENCY") {
            self.concurrency = concurrency.trim().parse::<usize>().map_err(|_| {
                ZigZagError::config(format!(
                    "ZIGZAG_CONCURRENCY must be a number, got '{}'",
                    concurrency
                ))
            })?;
        }

        Ok(())
    }
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub api_token: String,
    pub project_id: u64,
    pub root_module: Option<String>,
    pub run_name: Option<String>,
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub field_mappings: FieldMappings,
    pub git: GitOverrides,
}

impl TryFrom<Config> for Settings {
    type Error = ZigZagError;

    fn try_from(config: Config) -> Result<Self> {
        let mut missing = Vec::new();
        let base_url = non_empty(config.base_url).unwrap_or_else(|| {
            missing.push("base_url");
            String::new()
        });
        let api_token = non_empty(config.api_token).unwrap_or_else(|| {
            missing.push("api_token");
            String::new()
        });
        let project_id = config.project_id.filter(|id| *id > 0).unwrap_or_else(|| {
            missing.push("project_id");
            0
        });

        if !missing.is_empty() {
            return Err(ZigZagError::config(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ZigZagError::config(
                "base_url must start with http:// or https://",
            ));
        }

        if config.concurrency == 0 {
            return Err(ZigZagError::config("concurrency must be greater than 0"));
        }

        if config.max_attempts == 0 {
            return Err(ZigZagError::config("max_attempts must be greater than 0"));
        }

        if config.request_timeout_secs == 0 {
            return Err(ZigZagError::config(
                "request_timeout_secs must be greater than 0",
            ));
        }

        Ok(Self {
            base_url,
            api_token,
            project_id,
            root_module: non_empty(config.root_module),
            run_name: non_empty(config.run_name),
            concurrency: config.concurrency,
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.initial_backoff_ms),
                Duration::from_millis(config.max_backoff_ms.max(config.initial_backoff_ms)),
            ),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            field_mappings: config.field_mappings,
            git: config.git,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
