//! # configs
//!
//! Runtime settings for the Khawater board, layered as:
//! built-in defaults, then an optional `khawater.toml` (or the file named by
//! `KHAWATER_CONFIG`), then `KHAWATER__<SECTION>__<KEY>` environment
//! variables. A `.env` file is read first when present.

use std::path::Path;

use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Config file looked up in the working directory when none is named.
pub const DEFAULT_CONFIG_FILE: &str = "khawater.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub board: BoardSettings,
    pub cache: CacheSettings,
    pub server: ServerSettings,
    pub log: LogSettings,
}

/// REST endpoint of the remote store. Empty values run the board offline.
#[derive(Debug, Deserialize)]
pub struct RemoteSettings {
    pub url: String,
    pub api_key: SecretString,
    pub collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardSettings {
    pub max_post_length: usize,
    pub posts_per_page: usize,
    /// Local cache key holding the timeline
    pub storage_key: String,
    /// Display name of the local user for non-anonymous whispers
    pub user_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Directory of the file cache; empty keeps the cache in memory
    pub dir: String,
    /// Largest entry accepted, in bytes; 0 disables the limit
    pub quota_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Default filter when `RUST_LOG` is unset
    pub filter: String,
}

impl Settings {
    /// Loads `.env`, the config file and the environment.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let file = std::env::var("KHAWATER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());

        let settings: Settings = defaults()?
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("KHAWATER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overlaid with one file only; the environment is ignored.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let settings: Settings = defaults()?
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Built-in defaults alone.
    pub fn defaults() -> Result<Self, SettingsError> {
        let settings: Settings = defaults()?.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.board.max_post_length == 0 {
            return Err(SettingsError::Invalid("board.max_post_length must be positive".into()));
        }
        if self.board.posts_per_page == 0 {
            return Err(SettingsError::Invalid("board.posts_per_page must be positive".into()));
        }
        if self.board.storage_key.trim().is_empty() {
            return Err(SettingsError::Invalid("board.storage_key must not be empty".into()));
        }
        if self.remote.collection.trim().is_empty() {
            return Err(SettingsError::Invalid("remote.collection must not be empty".into()));
        }
        Ok(())
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, SettingsError> {
    Ok(Config::builder()
        .set_default("remote.url", "")?
        .set_default("remote.api_key", "")?
        .set_default("remote.collection", "posts")?
        .set_default("board.max_post_length", 280)?
        .set_default("board.posts_per_page", 20)?
        .set_default("board.storage_key", "khawater_posts")?
        .set_default("board.user_name", "مستخدم مجهول")?
        .set_default("cache.dir", "./data/cache")?
        .set_default("cache.quota_bytes", 5 * 1024 * 1024)?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("log.json", false)?
        .set_default("log.filter", "info")?)
}
