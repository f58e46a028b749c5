//! # nanotrade-client: Typed Client for the NanoTrade API
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        nanotrade-client                                 │
//! │                                                                         │
//! │  ClientConfig ──► ApiClient ──────────── reqwest ───► /api/v1 (axum)    │
//! │  (config crate)      │                                                  │
//! │                      ▼                                                  │
//! │                 AuthSession ◄──► session.json                           │
//! │                 token • user • business                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nanotrade_client::{ApiClient, ClientConfig};
//! use nanotrade_core::ListParams;
//!
//! let mut client = ApiClient::new(&ClientConfig::load()?)?;
//! client.login("demo", "demo-password").await?;
//! let page = client.products(&ListParams::default()).await?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod session;

pub use api::{ApiClient, ImageUpload};
pub use config::{ClientConfig, DEFAULT_API_BASE_URL};
pub use error::{ClientError, ClientResult, ErrorEnvelope};
pub use session::AuthSession;
