//! Configuration loading and credential persistence for Parley.
//!
//! Everything lives under `~/.parley/`:
//!
//! | File | Contents |
//! |------|----------|
//! | `config.toml` | model, endpoint, request deadline, UI options |
//! | `credentials.toml` | the Gemini API key (mode `0600`) |
//! | `logs/parley.log` | tracing output |
//!
//! The config file is optional and read once at startup. The credential file is
//! owned by [`FileCredentialStore`].

mod credentials;
mod persist;

pub use credentials::{CredentialError, CredentialStore, FileCredentialStore, MemoryCredentialStore};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);

const APP_DIR: &str = ".parley";

#[derive(Debug, Default, Deserialize)]
pub struct ParleyConfig {
    pub app: Option<AppConfig>,
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Use ASCII-only glyphs for icons and spinners.
    #[serde(default)]
    pub ascii_only: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeminiConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Per-turn deadline. Zero is ignored.
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

impl ParleyConfig {
    /// Load `~/.parley/config.toml`. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!(path = %path.display(), %source, "Failed to read config");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!(path = %path.display(), %source, "Failed to parse config");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[must_use]
    pub fn ascii_only(&self) -> bool {
        self.app.as_ref().is_some_and(|app| app.ascii_only)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.gemini
            .as_ref()
            .and_then(|g| g.model.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.gemini
            .as_ref()
            .and_then(|g| g.base_url.as_deref())
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_GEMINI_BASE_URL)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.gemini
            .as_ref()
            .and_then(|g| g.request_timeout_ms)
            .filter(|ms| *ms > 0)
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_millis)
    }
}

/// `~/.parley`, or `None` when the home directory is unknown.
#[must_use]
pub fn parley_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR))
}

/// Working-directory fallback used when there is no home directory.
#[must_use]
pub fn local_parley_dir() -> PathBuf {
    PathBuf::from(APP_DIR)
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    parley_home().map(|dir| dir.join("config.toml"))
}

#[must_use]
pub fn credentials_path() -> PathBuf {
    parley_home()
        .unwrap_or_else(local_parley_dir)
        .join("credentials.toml")
}
