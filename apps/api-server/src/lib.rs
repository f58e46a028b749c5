//! # NanoTrade API Server
//!
//! REST API for shops, catalog, inventory, the point of sale and escrow.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Server                                      │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐ │
//! │  │  auth        │  │  catalog     │  │  inventory   │  │  pos        │ │
//! │  │ • register   │  │ • categories │  │ • warehouses │  │ • cart      │ │
//! │  │ • login      │  │ • products   │  │ • stock rows │  │ • promo     │ │
//! │  │ • logout     │  │ • suppliers  │  │ • movements  │  │ • checkout  │ │
//! │  │ • me         │  │              │  │ • reorder    │  │             │ │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └─────────────┘ │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌─────────────┐ │
//! │  │  business    │  │  sales       │  │  reports     │  │  commerce   │ │
//! │  │ • business   │  │ • receipts   │  │ • escrow     │  │ • customers │ │
//! │  │ • shops      │  │ • cancel     │  │ • ledger     │  │ • expenses  │ │
//! │  │ • employees  │  │ • payments   │  │ • balance    │  │ • orders    │ │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └─────────────┘ │
//! │                                                                         │
//! │  AppState: Database (sqlx pool) • CartStore • TokenManager • config    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod cart;
pub mod config;
pub mod error;
pub mod extract;
pub mod media;
pub mod routes;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use nanotrade_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-exports
pub use auth::TokenManager;
pub use cart::CartStore;
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use media::MediaStore;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub carts: CartStore,
    pub tokens: TokenManager,
    pub media: MediaStore,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            carts: CartStore::new(),
            tokens: TokenManager::new(&config.jwt_secret, config.token_ttl_secs),
            media: MediaStore::new(config.media_dir.clone()),
            config,
        }
    }
}

/// Builds the full router: `/health` plus the `/api/v1` API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
