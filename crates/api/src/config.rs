//! Application Configuration
//!
//! Layered from an optional TOML file and `RELAY__`-prefixed environment
//! variables (`RELAY__NOTIFY__SMTP_HOST=mail.internal`).

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use notify::NotifyConfig;
use serde::{Deserialize, Serialize};
use webhook::{AlertConfig, WebhookConfig};

use crate::rate_limit::RateLimitConfig;
use crate::topology::TopologyConfig;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_VAR: &str = "RELAY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Max tracing level (trace, debug, info, warn, error)
    pub log_level: String,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub webhook: WebhookConfig,
    pub alert: AlertConfig,
    pub notify: NotifyConfig,
    pub topology: TopologyConfig,
}

impl AppConfig {
    /// Load from the file named by `RELAY_CONFIG` (default `config/relay.toml`) and the environment
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path))?
            .try_deserialize()
            .context("invalid configuration")
    }
}
