//! Configuration loading for the holonotes client.
//!
//! All fields are required unless explicitly marked optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "HOLONOTES_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Local agent the binary authors actions as.
    pub agent_name: String,
    pub role_name: String,
    pub zome_name: String,
    /// Websocket endpoint relaying signals from a remote node.
    #[serde(default)]
    pub signal_endpoint: Option<String>,
    #[serde(default)]
    pub delete_policy: DeletePolicy,
    /// Overridden by `RUST_LOG` when set.
    #[serde(default)]
    pub log_filter: Option<String>,
    pub reconnect: ReconnectConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub jitter_ms: u64,
}

/// How a detail fetch treats a chain that carries a Delete action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Deletion is metadata; the latest payload is still returned.
    #[default]
    Advisory,
    /// A deleted chain reads as not found.
    Absent,
}

/// The subset of configuration every component reads through the
/// connection context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub role_name: String,
    pub zome_name: String,
    pub delete_policy: DeletePolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            role_name: "notes".to_string(),
            zome_name: holonotes_core::NOTES_ZOME.to_string(),
            delete_policy: DeletePolicy::Advisory,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or HOLONOTES_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args(std::env::args().skip(1)).or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent_name.trim().is_empty() {
            return Err(invalid("agent_name", "must not be empty"));
        }
        if self.role_name.trim().is_empty() {
            return Err(invalid("role_name", "must not be empty"));
        }
        if self.zome_name.trim().is_empty() {
            return Err(invalid("zome_name", "must not be empty"));
        }
        if let Some(endpoint) = &self.signal_endpoint {
            if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
                return Err(invalid("signal_endpoint", "must be a ws:// or wss:// URL"));
            }
        }
        if self.reconnect.initial_ms == 0 {
            return Err(invalid("reconnect.initial_ms", "must be > 0"));
        }
        if self.reconnect.max_ms < self.reconnect.initial_ms {
            return Err(invalid("reconnect.max_ms", "must be >= initial_ms"));
        }
        if self.reconnect.multiplier < 1.0 {
            return Err(invalid("reconnect.multiplier", "must be >= 1.0"));
        }
        Ok(())
    }

    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            role_name: self.role_name.clone(),
            zome_name: self.zome_name.clone(),
            delete_policy: self.delete_policy,
        }
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args(mut args: impl Iterator<Item = String>) -> Option<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
