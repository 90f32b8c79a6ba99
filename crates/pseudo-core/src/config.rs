//! Configuration loading and persistence.
//!
//! The config file is optional: every field has a default, and a missing file
//! behaves like an empty one. Writes go through `toml_edit` so user comments
//! survive `save_model`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `server_url`.
pub const SERVER_URL_ENV: &str = "PSEUDO_SERVER_URL";

pub mod paths {
    //! Path resolution for pseudo configuration and data directories.
    //!
    //! PSEUDO_HOME resolution order:
    //! 1. PSEUDO_HOME environment variable (if set)
    //! 2. ~/.config/pseudo (default)
    //! 3. `.pseudo` in the working directory when no home directory exists

    use std::path::PathBuf;

    /// Returns the pseudo home directory.
    pub fn pseudo_home() -> PathBuf {
        if let Ok(home) = std::env::var("PSEUDO_HOME")
            && !home.trim().is_empty()
        {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".pseudo"),
            |h| h.join(".config").join("pseudo"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        pseudo_home().join("config.toml")
    }

    /// Returns the directory holding log files of interactive sessions.
    pub fn logs_dir() -> PathBuf {
        pseudo_home().join("logs")
    }
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// Keeps the template's comments while preserving every value the user set.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::{DocumentMut, Item};

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;
    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    for (key, value) in user_doc.as_table() {
        match value {
            Item::Value(v) => doc[key] = Item::Value(v.clone()),
            Item::Table(_) | Item::ArrayOfTables(_) => doc[key] = value.clone(),
            Item::None => {}
        }
    }

    Ok(doc.to_string())
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat backend.
    pub server_url: String,

    /// Model identifier sent with each message ("Auto" = server decides).
    pub model: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Log filter used when `PSEUDO_LOG` is not set.
    pub log_filter: String,

    /// Where saved media lands; the user's download directory when unset.
    pub download_dir: Option<PathBuf>,
}

impl Config {
    pub const DEFAULT_SERVER_URL: &'static str = "http://127.0.0.1:5000";
    pub const DEFAULT_MODEL: &'static str = "Auto";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_LOG_FILTER: &'static str = "info";

    /// Loads configuration from the default path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default config to `path`.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Saves only the model field to the config file.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read, parsed or written.
    pub fn save_model(model: &str) -> Result<()> {
        Self::save_model_to(&paths::config_path(), model)
    }

    /// Saves only the model field to a specific config file path.
    ///
    /// Creates the file from the template if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the config cannot be read, parsed or written.
    pub fn save_model_to(path: &Path, model: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        doc["model"] = value(model);

        Self::write_config(path, &doc.to_string())
    }

    /// Resolves the server URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the winning value is not a valid URL.
    pub fn resolve_server_url(&self) -> Result<String> {
        let env = std::env::var(SERVER_URL_ENV).ok();
        resolve_server_url_from(env.as_deref(), &self.server_url)
    }

    /// Directory for downloaded media: config, then the platform download
    /// directory, then the working directory.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Request timeout as a `Duration` (never zero).
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: Self::DEFAULT_SERVER_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            request_timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            log_filter: Self::DEFAULT_LOG_FILTER.to_string(),
            download_dir: None,
        }
    }
}

/// Picks the first non-blank candidate and validates it.
///
/// Trailing slashes are dropped so endpoint paths can be appended directly.
fn resolve_server_url_from(env_value: Option<&str>, config_value: &str) -> Result<String> {
    let candidate = [env_value, Some(config_value)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or(Config::DEFAULT_SERVER_URL);

    url::Url::parse(candidate).with_context(|| format!("Invalid server URL: {candidate}"))?;
    Ok(candidate.trim_end_matches('/').to_string())
}
