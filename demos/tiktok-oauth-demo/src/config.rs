//! Configuration for the TikTok login demo
//!
//! Sources, lowest precedence first:
//! - Built-in defaults
//! - TOML file (`tiktok-demo.toml`, or the path in `TIKTOK_DEMO_CONFIG_FILE`)
//! - Environment variables with the `TIKTOK_DEMO` prefix, e.g.
//!   `TIKTOK_DEMO__TIKTOK__CLIENT_KEY`

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use ras_identity_tiktok::TikTokStrategyOptions;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const CONFIG_FILE_VAR: &str = "TIKTOK_DEMO_CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = "tiktok-demo.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub server: ServerConfig,

    /// Passed straight to the strategy
    pub tiktok: TikTokStrategyOptions,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1)
    pub host: IpAddr,

    /// Port to bind to (default: 3000)
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset, in `EnvFilter` syntax
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl DemoConfig {
    /// Load from the optional config file and the environment, then validate.
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        let config_path =
            std::env::var(CONFIG_FILE_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        if std::path::Path::new(&config_path).exists() {
            info!("Loading configuration from {}", config_path);
            builder = builder.add_source(File::with_name(&config_path));
        } else {
            debug!("No config file found at {}, using defaults", config_path);
        }

        builder = builder.add_source(
            Environment::with_prefix("TIKTOK_DEMO")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("tiktok.scope")
                .try_parsing(true),
        );

        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: DemoConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Checks the demo's own settings. The strategy validates `client_key`
    /// itself when it is constructed.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.tiktok.client_id.trim().is_empty() {
            anyhow::bail!("tiktok.client_id is required");
        }

        if self.tiktok.callback_url.trim().is_empty() {
            anyhow::bail!("tiktok.callback_url is required");
        }

        EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("Invalid log filter '{}'", self.logging.level))?;

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<DemoConfig> {
        DemoConfig::from_builder(
            Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = DemoConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.logging.level, "info");
        assert!(config.tiktok.client_key.is_none());
    }

    #[test]
    fn test_defaults_fail_validation_without_credentials() {
        let err = DemoConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("client_id"));
    }

    #[test]
    fn test_load_from_toml() {
        let config = from_toml(
            r#"
            [server]
            port = 8080

            [tiktok]
            client_id = "demo-id"
            client_secret = "demo-secret"
            client_key = "demo-key"
            callback_url = "http://localhost:8080/auth/tiktok/callback"
            scope = ["user.info.basic", "user.info.profile"]

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.tiktok.client_key.as_deref(), Some("demo-key"));
        assert_eq!(
            config.tiktok.scope,
            Some(vec![
                "user.info.basic".to_string(),
                "user.info.profile".to_string()
            ])
        );
        assert_eq!(config.tiktok.profile_url, None);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_log_filter_directives_accepted() {
        let config = from_toml(
            r#"
            [tiktok]
            client_id = "demo-id"
            callback_url = "http://localhost:3000/auth/tiktok/callback"

            [logging]
            level = "info,ras_identity_tiktok=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "info,ras_identity_tiktok=debug");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = from_toml(
            r#"
            [tiktok]
            client_id = "demo-id"
            callback_url = "http://localhost:3000/auth/tiktok/callback"

            [logging]
            level = "ras_identity_tiktok=loud"
            "#,
        );
        assert!(result.is_err());
    }
}
