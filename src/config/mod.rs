//! Configuration and session cookie storage

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::CookieJar;

/// Backend origin used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";

/// Environment variable overriding `server.base_url`.
pub const BASE_URL_ENV: &str = "CHEECHAT_URL";

/// Backend location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP origin of the backend, e.g. `http://localhost:9000`.
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Cookies set by the backend (the session lives in `id`).
    #[serde(default)]
    pub cookies: CookieJar,
    /// File this config was loaded from; `None` keeps cookies in memory only.
    #[serde(skip)]
    pub file: Option<PathBuf>,
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "cheechat", "cheechat-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk, then apply the environment override.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).context("Failed to read config file")?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        config.file = Some(path);

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!("Using {} from environment: {}", BASE_URL_ENV, url);
                config.server.base_url = url;
            }
        }

        Ok(config)
    }

    fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Write this config to `path`, readable by the owner only.
    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        // Holds the session cookie
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// Persist only the cookie jar into `path`, keeping whatever else is there.
    ///
    /// `--server` and `CHEECHAT_URL` overrides must not leak into the file.
    pub fn save_cookies(path: &Path, jar: &CookieJar) -> Result<()> {
        let mut on_disk = if path.exists() {
            let content = fs::read_to_string(path).context("Failed to read config file")?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        on_disk.cookies = jar.clone();
        on_disk.save_to(path)
    }

    /// HTTP origin without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.server.base_url.trim_end_matches('/')
    }

    /// WebSocket origin derived from the HTTP origin.
    pub fn ws_base_url(&self) -> String {
        let base = self.base_url();
        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        }
    }
}
