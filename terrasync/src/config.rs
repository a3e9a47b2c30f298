//! Configuration management for terrasync.
//!
//! Loads configuration from a TOML file. Every field has a default, so an
//! empty file (or no file at all) is a valid configuration; command-line
//! flags override whatever the file says.

use crate::sync::boundaries::DownloadBoundaries;
use crate::sync::plan::Mode;
use crate::transfer::{Credentials, HttpOptions, RetryPolicy};
use crate::utils::errors::BoundaryError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub bounds: BoundsConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the repository (http or https)
    #[serde(default = "default_url")]
    pub url: String,

    /// HTTP basic authentication, used when a username is set
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Local directory holding the mirror
    #[serde(default = "default_target")]
    pub target: PathBuf,

    #[serde(default)]
    pub mode: Mode,

    /// Do not descend into directories whose .dirindex already matches
    #[serde(default)]
    pub quick: bool,

    /// Delete local files and directories the server does not declare
    #[serde(default)]
    pub remove_orphan: bool,

    /// Print the report at the end of the run
    #[serde(default)]
    pub report: bool,

    /// Repository directory to start from
    #[serde(default = "default_subdir")]
    pub subdir: String,
}

/// Download rectangle, in degrees. Missing edges default to the whole globe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundsConfig {
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Retries after a failed first attempt
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Whole-request timeout; none by default
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_url() -> String {
    "http://flightgear.sourceforge.net/scenery".to_string()
}

fn default_target() -> PathBuf {
    PathBuf::from(".")
}

fn default_subdir() -> String {
    "/".to_string()
}

fn default_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            target: default_target(),
            mode: Mode::default(),
            quick: false,
            remove_orphan: false,
            report: false,
            subdir: default_subdir(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl ServerConfig {
    /// Credentials, when a username is configured.
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: self.password.clone().unwrap_or_default(),
        })
    }
}

impl BoundsConfig {
    /// `None` when no edge is set, so that no bucket is ever filtered.
    pub fn to_boundaries(&self) -> Result<Option<DownloadBoundaries>, BoundaryError> {
        if self.top.is_none() && self.bottom.is_none() && self.left.is_none() && self.right.is_none() {
            return Ok(None);
        }

        let world = DownloadBoundaries::world();
        DownloadBoundaries::new(
            self.top.unwrap_or(world.top()),
            self.left.unwrap_or(world.left()),
            self.bottom.unwrap_or(world.bottom()),
            self.right.unwrap_or(world.right()),
        )
        .map(Some)
    }
}

impl TransportConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn http_options(&self, auth: Option<Credentials>) -> HttpOptions {
        HttpOptions {
            auth,
            retry: self.retry_policy(),
            timeout: self.timeout_secs.map(Duration::from_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://flightgear.sourceforge.net/scenery");
        assert_eq!(config.sync.target, PathBuf::from("."));
        assert_eq!(config.sync.mode, Mode::Sync);
        assert_eq!(config.sync.subdir, "/");
        assert_eq!(config.transport.retry_policy(), RetryPolicy::default());
        assert_eq!(config.log.level, "info");
        assert!(config.server.credentials().is_none());
    }

    #[test]
    fn test_empty_file_is_valid() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.transport.retries, 5);
        assert!(!config.sync.quick);
    }

    #[test]
    fn test_from_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"
[server]
url = "https://mirror.example.org/scenery"
username = "pilot"
password = "secret"

[sync]
target = "/srv/scenery"
mode = "check"
quick = true
subdir = "/Terrain"

[bounds]
top = 52.0
bottom = 50.0

[transport]
retries = 2
retry_delay_ms = 10
timeout_secs = 60

[log]
level = "debug"
"#,
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.url, "https://mirror.example.org/scenery");
        assert_eq!(config.sync.mode, Mode::Check);
        assert!(config.sync.quick);
        assert!(!config.sync.remove_orphan);
        assert_eq!(config.sync.subdir, "/Terrain");
        assert_eq!(config.log.level, "debug");

        let auth = config.server.credentials().unwrap();
        assert_eq!(auth.username, "pilot");
        assert_eq!(auth.password, "secret");

        let options = config.transport.http_options(Some(auth));
        assert_eq!(options.retry.retries, 2);
        assert_eq!(options.retry.delay, Duration::from_millis(10));
        assert_eq!(options.timeout, Some(Duration::from_secs(60)));
        assert_eq!(options.connect_timeout, Duration::from_secs(30));

        let bounds = config.bounds.to_boundaries().unwrap().unwrap();
        assert_eq!(bounds.top(), 52.0);
        assert_eq!(bounds.bottom(), 50.0);
        assert_eq!(bounds.left(), -180.0);
        assert_eq!(bounds.right(), 180.0);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let result: Result<Config, _> = toml::from_str("[sync]\nmode = \"mirror\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_bounds() {
        assert!(BoundsConfig::default().to_boundaries().unwrap().is_none());

        let inverted = BoundsConfig {
            top: Some(10.0),
            bottom: Some(20.0),
            ..BoundsConfig::default()
        };
        assert!(matches!(
            inverted.to_boundaries(),
            Err(BoundaryError::Inverted { .. })
        ));
    }
}
