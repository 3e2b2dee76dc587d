//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/filedrop/config.toml`
//! - Windows: `%APPDATA%/filedrop/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "FILEDROP_API_KEY";

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Developer API key. Prefer the environment variable over storing it here.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User identifier sent when authorizing.
    #[serde(default = "default_user")]
    pub user: String,

    /// Scratch directory for part files.
    #[serde(default = "default_chunk_dir")]
    pub chunk_dir: PathBuf,

    #[serde(default = "default_token_max_age_days")]
    pub token_max_age_days: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    filedrop_protocol::constants::DEFAULT_BASE_URL.into()
}

fn default_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "filedrop".into())
}

fn default_chunk_dir() -> PathBuf {
    std::env::temp_dir().join("filedrop-chunks")
}

fn default_token_max_age_days() -> u64 {
    300
}

fn default_timeout_secs() -> u64 {
    filedrop_client::DEFAULT_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            user: default_user(),
            chunk_dir: default_chunk_dir(),
            token_max_age_days: default_token_max_age_days(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // May hold the API key.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Replaces the API key when `key` is set and non-empty.
    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = key;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn token_max_age(&self) -> Duration {
        Duration::from_secs(self.token_max_age_days.saturating_mul(24 * 60 * 60))
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let base = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
            .map_err(|_| anyhow::anyhow!("neither XDG_CONFIG_HOME nor HOME is set"))?;
        Ok(base.join("filedrop").join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| anyhow::anyhow!("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("filedrop").join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("filedrop")
            .join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.api_key.is_empty());
        assert_eq!(config.base_url, "https://dev.wetransfer.com/v2");
        assert!(!config.user.is_empty());
        assert_eq!(config.token_max_age_days, 300);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn config_partial_toml() {
        let config: Config = toml::from_str(r#"api_key = "k-1""#).unwrap();
        assert_eq!(config.api_key, "k-1");
        assert_eq!(config.base_url, "https://dev.wetransfer.com/v2");
        assert_eq!(config.token_max_age_days, 300);
    }

    #[test]
    fn config_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("filedrop").join("config.toml");

        let config = Config {
            api_key: "secret".into(),
            user: "bob".into(),
            chunk_dir: tmp.path().join("chunks"),
            timeout_secs: 30,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_config_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.token_max_age_days, 300);
    }

    #[cfg(unix)]
    #[test]
    fn saved_config_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        Config::default().save_to(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn api_key_override() {
        let mut config = Config {
            api_key: "from-file".into(),
            ..Config::default()
        };
        config.override_api_key(Some("  ".into()));
        assert_eq!(config.api_key, "from-file");
        config.override_api_key(None);
        assert_eq!(config.api_key, "from-file");
        config.override_api_key(Some("from-env".into()));
        assert_eq!(config.api_key, "from-env");
    }

    #[test]
    fn token_max_age_in_days() {
        let config = Config {
            token_max_age_days: 2,
            ..Config::default()
        };
        assert_eq!(config.token_max_age(), Duration::from_secs(2 * 86_400));
    }

    #[test]
    fn huge_token_max_age_saturates() {
        let config = Config {
            token_max_age_days: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.token_max_age(), Duration::from_secs(u64::MAX));
    }
}
