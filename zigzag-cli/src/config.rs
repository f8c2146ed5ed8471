//! Command-line overrides on top of the file and environment configuration

use std::path::PathBuf;
use zigzag_uploader::Config;

/// Settings given on the command line; each one wins over file and environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub project_id: Option<u64>,
    pub root_module: Option<String>,
    pub run_name: Option<String>,
    pub concurrency: Option<usize>,
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub repository: Option<String>,
}

impl Overrides {
    pub fn apply(self, config: &mut Config) {
        fn set<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut config.base_url, self.base_url);
        set(&mut config.api_token, self.api_token);
        set(&mut config.project_id, self.project_id);
        set(&mut config.root_module, self.root_module);
        set(&mut config.run_name, self.run_name);
        set(&mut config.git.branch, self.branch);
        set(&mut config.git.commit, self.commit);
        set(&mut config.git.repository, self.repository);

        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win() {
        let mut config = Config {
            base_url: Some("https://file.example.com".to_string()),
            project_id: Some(1),
            ..Config::default()
        };

        Overrides {
            project_id: Some(2),
            concurrency: Some(8),
            commit: Some("abc".to_string()),
            ..Overrides::default()
        }
        .apply(&mut config);

        assert_eq!(config.base_url.as_deref(), Some("https://file.example.com"));
        assert_eq!(config.project_id, Some(2));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.git.commit.as_deref(), Some("abc"));
    }
}
