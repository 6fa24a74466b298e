use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{AgoraError, Result};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DB_PATH: &str = "agora.sqlite";

pub const PUBLIC_CHAT_NAME: &str = "public_chat";
pub const MAX_TEXT_LEN: usize = 255;
pub const TOKEN_BYTES: usize = 16;

/// Rate-limit window for the public chat: at most RATE_LIMIT_MAX posts per
/// RATE_LIMIT_WINDOW_SECS, per user.
pub const RATE_LIMIT_MAX: i64 = 20;
pub const RATE_LIMIT_WINDOW_SECS: i64 = 60 * 60;

/// Cautions -> ban state machine thresholds.
pub const CAUTIONS_TO_BAN: i64 = 3;
pub const BAN_DURATION_SECS: i64 = 4 * 60 * 60;

pub const DEFAULT_CONNECT_MESSAGES: i64 = 20;

/// Top-level config (agora.toml + AGORA_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgoraConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for AgoraConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl AgoraConfig {
    /// Load config from an optional TOML file with AGORA_* env var
    /// overrides. Falls back to defaults when no file is present.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(
            AgoraConfig::default(),
        ));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("AGORA_").split("_"));

        figment
            .extract()
            .map_err(|e| AgoraError::Config(e.to_string()))
    }
}
