//! API server configuration module.
//!
//! Configuration is layered with the `config` crate:
//!
//! ```text
//! built-in defaults ──► nanotrade.toml (optional) ──► NANOTRADE_* env vars
//! ```
//!
//! | Key | Env var | Default |
//! |-----|---------|---------|
//! | `bind_addr` | `NANOTRADE_BIND_ADDR` | `0.0.0.0:8000` |
//! | `database_path` | `NANOTRADE_DATABASE_PATH` | `./nanotrade.db` |
//! | `media_dir` | `NANOTRADE_MEDIA_DIR` | `./media` |
//! | `jwt_secret` | `NANOTRADE_JWT_SECRET` | development secret |
//! | `token_ttl_secs` | `NANOTRADE_TOKEN_TTL_SECS` | `86400` (1 day) |
//! | `currency` | `NANOTRADE_CURRENCY` | `XAF` |
//! | `max_upload_bytes` | `NANOTRADE_MAX_UPLOAD_BYTES` | `5242880` (5 MiB) |
//! | `promo_codes` | (toml table only) | `WELCOME10 = 1000` |

use std::collections::HashMap;
use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use nanotrade_core::DEFAULT_CURRENCY;
use serde::Deserialize;

const DEV_JWT_SECRET: &str = "nanotrade-dev-secret-change-in-production";

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Directory uploaded images are written to and served from
    pub media_dir: PathBuf,

    /// HS256 secret for signing API tokens
    pub jwt_secret: String,

    /// API token lifetime in seconds
    pub token_ttl_secs: u64,

    /// Currency code shown on reports
    pub currency: String,

    /// Largest accepted request body (multipart uploads included)
    pub max_upload_bytes: usize,

    /// Promo code → discount in basis points
    #[serde(default)]
    pub promo_codes: HashMap<String, u32>,
}

impl ServerConfig {
    /// Load configuration from `nanotrade.toml` (if present) and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder().add_source(File::with_name("nanotrade").required(false)),
        )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        let settings = builder
            .add_source(Environment::with_prefix("NANOTRADE").try_parsing(true))
            .set_default("bind_addr", defaults.bind_addr)?
            .set_default("database_path", defaults.database_path.to_string_lossy().into_owned())?
            .set_default("media_dir", defaults.media_dir.to_string_lossy().into_owned())?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("token_ttl_secs", defaults.token_ttl_secs)?
            .set_default("currency", defaults.currency)?
            .set_default("max_upload_bytes", defaults.max_upload_bytes as u64)?
            .set_default("promo_codes.WELCOME10", 1000)?
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "token_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::InvalidValue(format!(
                "token_ttl_secs must be at most {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if let Some((code, bps)) = self.promo_codes.iter().find(|(_, bps)| **bps > 10_000) {
            return Err(ConfigError::InvalidValue(format!(
                "promo code {} discounts {} bps, above 100%",
                code, bps
            )));
        }
        Ok(())
    }

    /// True while the built-in development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Discount of a promo code, matched case-insensitively.
    pub fn promo_discount(&self, code: &str) -> Option<u32> {
        let code = code.trim();
        self.promo_codes
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(code))
            .map(|(_, bps)| *bps)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:8000".to_string(),
            database_path: PathBuf::from("./nanotrade.db"),
            media_dir: PathBuf::from("./media"),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: 86_400,
            currency: DEFAULT_CURRENCY.to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            promo_codes: HashMap::from([("WELCOME10".to_string(), 1000)]),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn from_toml(contents: &str) -> Result<ServerConfig, ConfigError> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        ServerConfig::from_builder(Config::builder().add_source(File::from(file.path())))
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.token_ttl_secs, 86_400);
        assert_eq!(config.currency, "XAF");
        assert_eq!(config.promo_discount("welcome10"), Some(1000));
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let config = from_toml(
            r#"
            bind_addr = "127.0.0.1:9000"
            jwt_secret = "a-real-secret"
            token_ttl_secs = 600

            [promo_codes]
            RAMADAN = 1500
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.token_ttl_secs, 600);
        assert_eq!(config.promo_discount("ramadan"), Some(1500));
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let err = from_toml(r#"jwt_secret = "  ""#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let err = from_toml("token_ttl_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_huge_ttl_is_rejected() {
        let err = from_toml("token_ttl_secs = 10000000000").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let config = from_toml(&format!("token_ttl_secs = {}", MAX_TOKEN_TTL_SECS)).unwrap();
        assert_eq!(config.token_ttl_secs, MAX_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_promo_above_full_price_is_rejected() {
        let mut config = ServerConfig::default();
        config.promo_codes.insert("FREE".to_string(), 20_000);
        assert!(config.validate().is_err());
    }
}
