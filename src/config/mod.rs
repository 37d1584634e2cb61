use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request path is resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Transport timeout in seconds (default: 36)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    36
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// What the gateway does when the backend reports an expired session
    #[serde(default)]
    pub failure_policy: AuthFailurePolicy,
    /// Lifetime of a stored session in seconds (default: 3600)
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            failure_policy: AuthFailurePolicy::default(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl AuthConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs)
    }
}

fn default_session_ttl_secs() -> i64 {
    crate::session::DEFAULT_SESSION_TTL_SECS
}

/// Reaction to a business-level 401.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthFailurePolicy {
    /// Drop the stored session without asking.
    #[default]
    Clear,
    /// Show the error, ask the user to log in again, and drop the session
    /// only if they accept.
    Confirm,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the credential jar
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout(), Duration::from_secs(36));
        assert_eq!(config.auth.failure_policy, AuthFailurePolicy::Clear);
        assert_eq!(config.auth.session_ttl(), chrono::Duration::hours(1));
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.api.timeout_secs, 36);
        assert_eq!(config.auth.session_ttl_secs, 3600);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [api]
            base_url = "https://blog.example.com/api"

            [auth]
            failure_policy = "confirm"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://blog.example.com/api");
        assert_eq!(config.api.timeout_secs, 36);
        assert_eq!(config.auth.failure_policy, AuthFailurePolicy::Confirm);
        assert_eq!(config.auth.session_ttl_secs, 3600);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = Config::from_toml("[auth]\nfailure_policy = \"ignore\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("blogdesk.toml")).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blogdesk.toml");
        std::fs::write(&path, "[storage]\ndata_dir = \"/var/lib/blogdesk\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/blogdesk"));
    }
}
