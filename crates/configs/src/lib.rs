//! animeblog/crates/configs/src/lib.rs
//!
//! Layered settings: built-in defaults, then an optional TOML file, then
//! `ANIMEBLOG__SECTION__KEY` environment variables (after `.env` is loaded).

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "config/animeblog.toml";
const ENV_PREFIX: &str = "ANIMEBLOG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    pub page_size: u32,
    pub search_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentSettings {
    /// How many reply levels the UI indents.
    pub max_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub token_path: PathBuf,
    /// Fixed token for scripted runs; bypasses the token file when set.
    #[serde(default)]
    pub token: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info,services=debug`.
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub feed: FeedSettings,
    pub comments: CommentSettings,
    pub session: SessionSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Loads `.env`, then [`DEFAULT_CONFIG_FILE`] if present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Same layering with an explicit (optional) file.
    pub fn load_from(file: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = Self::defaults()?
            .add_source(File::from(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("api.base_url", "http://localhost:3000/api")?
            .set_default("api.request_timeout_secs", 10)?
            .set_default("feed.page_size", 12)?
            .set_default("feed.search_limit", 20)?
            .set_default("comments.max_depth", 3)?
            .set_default("session.token_path", ".animeblog/session.json")?
            .set_default("log.filter", "info")?
            .set_default("log.json", false)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.request_timeout_secs must be positive".into()));
        }
        if self.feed.page_size == 0 || self.feed.search_limit == 0 {
            return Err(ConfigError::Invalid("feed sizes must be positive".into()));
        }
        if self.comments.max_depth == 0 {
            return Err(ConfigError::Invalid("comments.max_depth must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_apply_without_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(settings.feed.page_size, 12);
        assert_eq!(settings.comments.max_depth, 3);
        assert!(!settings.log.json);
        assert!(settings.session.token.is_none());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animeblog.toml");
        fs::write(
            &path,
            "[api]\nbase_url = \"https://blog.example/api\"\n\n[feed]\npage_size = 30\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.api.base_url, "https://blog.example/api");
        assert_eq!(settings.feed.page_size, 30);
        assert_eq!(settings.feed.search_limit, 20);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("animeblog.toml");
        fs::write(&path, "[feed]\npage_size = 0\n").unwrap();

        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Invalid(_))));
    }
}
