//! Configuration management
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `CALLRELAY__SECTION__KEY` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "CALLRELAY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "callrelay.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub signaling: SignalingConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalingConfig {
    /// Seconds a call may ring before it is ended; 0 disables the timeout
    pub ring_timeout_secs: u64,
    pub max_identity_len: usize,
    pub max_display_name_len: usize,
}

impl SignalingConfig {
    pub fn ring_timeout(&self) -> Option<Duration> {
        (self.ring_timeout_secs > 0).then(|| Duration::from_secs(self.ring_timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Require a verified token on the signaling socket
    pub enabled: bool,
    /// token -> identity granted by that token
    #[serde(default)]
    pub tokens: HashMap<String, TokenGrant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub identity: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: Vec::new(),
            },
            signaling: SignalingConfig::default(),
            auth: AuthConfig {
                enabled: false,
                tokens: HashMap::new(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for SignalingConfig {
    fn default() -> Self {
        Self {
            ring_timeout_secs: 0,
            max_identity_len: 128,
            max_display_name_len: 64,
        }
    }
}

impl Config {
    /// Load from the file named by `CALLRELAY_CONFIG` (or `callrelay.toml`)
    /// and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CALLRELAY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(document: &str) -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn builder(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let defaults = Config::default();
        config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default(
                "signaling.ring_timeout_secs",
                defaults.signaling.ring_timeout_secs as i64,
            )?
            .set_default(
                "signaling.max_identity_len",
                defaults.signaling.max_identity_len as i64,
            )?
            .set_default(
                "signaling.max_display_name_len",
                defaults.signaling.max_display_name_len as i64,
            )?
            .set_default("auth.enabled", defaults.auth.enabled)?
            .set_default("logging.level", defaults.logging.level)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.signaling.ring_timeout(), None);
        assert!(!config.auth.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_overrides() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 9000
            cors_origins = ["http://localhost:5173"]

            [signaling]
            ring_timeout_secs = 30

            [auth]
            enabled = true

            [auth.tokens.secret-a]
            identity = "alice"
            display_name = "Alice"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.signaling.ring_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.signaling.max_identity_len, 128);
        assert!(config.auth.enabled);
        assert_eq!(config.auth.tokens["secret-a"].identity, "alice");
    }
}
