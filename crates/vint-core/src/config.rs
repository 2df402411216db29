//! Client configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. Check for override in data dir (~/.local/share/vint/config/client.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//! 3. Apply `VINT_API_URL` / `VINT_DATA_DIR` from the environment
//!
//! Command-line flags are applied on top by the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::dashboard::SummaryWindow;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/client.toml");

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub api_url: String,
    /// Dashboard window used when none is given
    pub default_window: SummaryWindow,
    /// Directory holding local storage
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            default_window: SummaryWindow::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl ClientConfig {
    /// Load from the default override location, then the environment
    pub fn load() -> Result<Self> {
        let config = load_config(default_config_path().as_deref())?;
        Ok(config.with_overrides(
            std::env::var("VINT_API_URL").ok(),
            std::env::var("VINT_DATA_DIR").ok().map(PathBuf::from),
        ))
    }

    /// Load with a custom config path (missing file means embedded defaults)
    pub fn with_config_path(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// Replace values that were explicitly given
    pub fn with_overrides(mut self, api_url: Option<String>, data_dir: Option<PathBuf>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }
}

/// Default data directory (~/.local/share/vint on Linux)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vint"))
        .unwrap_or_else(|| PathBuf::from(".vint"))
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("vint").join("config").join("client.toml"))
}

fn load_config(override_path: Option<&Path>) -> Result<ClientConfig> {
    let content = match override_path {
        Some(path) if path.exists() => {
            debug!("Loading config from {}", path.display());
            fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    api: Option<RawApi>,
    dashboard: Option<RawDashboard>,
    storage: Option<RawStorage>,
}

#[derive(Debug, Deserialize)]
struct RawApi {
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDashboard {
    default_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawStorage {
    data_dir: Option<PathBuf>,
}

fn parse_config(content: &str) -> Result<ClientConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = ClientConfig::default();

    if let Some(url) = raw.api.and_then(|api| api.base_url) {
        config.api_url = url.trim_end_matches('/').to_string();
    }

    if let Some(days) = raw.dashboard.and_then(|d| d.default_days) {
        config.default_window = SummaryWindow::from_days(days).ok_or_else(|| {
            Error::Config(format!("default_days must be 7, 30 or 90, got {}", days))
        })?;
    }

    if let Some(dir) = raw.storage.and_then(|s| s.data_dir) {
        config.data_dir = dir;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.default_window, SummaryWindow::Days30);
        assert_eq!(config.data_dir, default_data_dir());
    }

    #[test]
    fn test_parse_custom_config() {
        let config = parse_config(
            r#"
            [api]
            base_url = "https://api.example.com/"

            [dashboard]
            default_days = 7

            [storage]
            data_dir = "/tmp/vint-test"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.default_window, SummaryWindow::Days7);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/vint-test"));
    }

    #[test]
    fn test_parse_rejects_unsupported_window() {
        let err = parse_config("[dashboard]\ndefault_days = 14\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(parse_config("[api\nbase_url=").is_err());
    }

    #[test]
    fn test_missing_override_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::with_config_path(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_override_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        fs::write(&path, "[api]\nbase_url = \"http://10.0.0.2:9000\"\n").unwrap();

        let config = ClientConfig::with_config_path(&path).unwrap();
        assert_eq!(config.api_url, "http://10.0.0.2:9000");
    }

    #[test]
    fn test_explicit_overrides_win() {
        let config = ClientConfig::default().with_overrides(
            Some("http://override:1234/".to_string()),
            Some(PathBuf::from("/data")),
        );
        assert_eq!(config.api_url, "http://override:1234");
        assert_eq!(config.data_dir, PathBuf::from("/data"));

        let unchanged = ClientConfig::default().with_overrides(Some("  ".to_string()), None);
        assert_eq!(unchanged, ClientConfig::default());
    }
}
