//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/casevault/casevault.toml`
//! - Windows: `%APPDATA%/casevault/casevault.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use casevault_transfer::{DEFAULT_CHUNK_SIZE, StageCheckpoints};
use casevault_upload::{AcceptFilter, BatchConfig};
use serde::{Deserialize, Serialize};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Base URL of the evidence API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Accept filter, e.g. `.mp4,.mov,image/*`. Empty accepts everything.
    #[serde(default)]
    pub accept: String,

    /// Files admitted per invocation; 0 is unlimited.
    #[serde(default)]
    pub max_files: usize,

    /// Uploads running at once; 0 is unlimited.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-request timeout in seconds; 0 disables it.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Progress granularity of direct writes, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_api_url() -> String {
    "http://localhost:8000".into()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            accept: String::new(),
            max_files: 0,
            max_concurrent: default_max_concurrent(),
            request_timeout_secs: default_request_timeout_secs(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from `path`, or creates a default file there.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: CliConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = CliConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Library-facing settings for one upload batch.
    pub fn batch_config(&self, case_id: &str) -> BatchConfig {
        BatchConfig {
            case_id: case_id.to_string(),
            accept: AcceptFilter::parse(&self.accept),
            max_files: self.max_files,
            max_concurrent: self.max_concurrent,
            checkpoints: StageCheckpoints::default(),
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("casevault")
            .join("casevault.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("casevault").join("casevault.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/casevault/casevault.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = CliConfig::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert!(config.accept.is_empty());
        assert_eq!(config.max_files, 0);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = CliConfig {
            api_url: "https://evidence.example.org".into(),
            accept: ".mp4,image/*".into(),
            max_files: 5,
            max_concurrent: 2,
            request_timeout_secs: 30,
            chunk_size: 4096,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: CliConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn config_partial_toml() {
        let config: CliConfig = toml::from_str(r#"accept = ".pdf""#).unwrap();
        assert_eq!(config.accept, ".pdf");
        assert_eq!(config.api_url, default_api_url());
        assert_eq!(config.max_concurrent, 4);
    }

    #[test]
    fn load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("casevault.toml");

        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config, CliConfig::default());
        assert!(path.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn load_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("casevault.toml");
        std::fs::write(&path, "max_files = 3\nrequest_timeout_secs = 0\n").unwrap();

        let config = CliConfig::load_from(&path).unwrap();
        assert_eq!(config.max_files, 3);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("casevault.toml");
        std::fs::write(&path, "max_files = \"many\"").unwrap();
        assert!(CliConfig::load_from(&path).is_err());
    }

    #[test]
    fn batch_config_carries_limits() {
        let config = CliConfig {
            accept: ".mov".into(),
            max_files: 2,
            max_concurrent: 1,
            ..CliConfig::default()
        };
        let batch = config.batch_config("case-1");
        assert_eq!(batch.case_id, "case-1");
        assert_eq!(batch.max_files, 2);
        assert_eq!(batch.max_concurrent, 1);
        assert_eq!(batch.accept, AcceptFilter::parse(".mov"));
    }

    #[test]
    fn config_path_not_empty() {
        let path = config_path().unwrap();
        assert!(path.to_string_lossy().contains("casevault"));
    }
}
