//! Client configuration.
//!
//! ```text
//! defaults ──► nanotrade.toml (optional) ──► NANOTRADE_* env vars
//! ```
//!
//! | Key | Env var | Default |
//! |-----|---------|---------|
//! | `api_base_url` | `NANOTRADE_API_BASE_URL` | `http://localhost:8000/api/v1` |
//! | `session_file` | `NANOTRADE_SESSION_FILE` | none (session kept in memory) |
//! | `timeout_secs` | `NANOTRADE_TIMEOUT_SECS` | `30` |

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ClientResult;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    #[serde(default)]
    pub session_file: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Loads the configuration from `nanotrade.toml` in the working
    /// directory (if present) and the environment.
    pub fn load() -> ClientResult<Self> {
        Self::load_from(Config::builder().add_source(File::with_name("nanotrade").required(false)))
    }

    fn load_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> ClientResult<Self> {
        let settings = builder
            .add_source(Environment::with_prefix("NANOTRADE"))
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("timeout_secs", 30)?
            .build()?;

        let mut config: ClientConfig = settings.try_deserialize()?;
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Configuration pointing at `base_url` with an in-memory session.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        ClientConfig {
            api_base_url: base_url.into().trim_end_matches('/').to_string(),
            session_file: None,
            timeout_secs: 30,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig::with_base_url(DEFAULT_API_BASE_URL)
    }
}
