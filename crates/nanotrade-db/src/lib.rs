//! # nanotrade-db: Database Layer for NanoTrade
//!
//! SQLite storage for every NanoTrade entity, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        NanoTrade Data Flow                              │
//! │                                                                         │
//! │  axum handler (GET /api/v1/products/shop/)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                  nanotrade-db (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐   ┌──────────────────┐   ┌──────────────┐   │    │
//! │  │   │   Database    │   │   Repositories   │   │  Migrations  │   │    │
//! │  │   │   (pool.rs)   │   │                  │   │  (embedded)  │   │    │
//! │  │   │               │   │ ProductRepo      │   │              │   │    │
//! │  │   │ SqlitePool    │◄──│ InventoryRepo    │   │ 001_initial  │   │    │
//! │  │   │               │   │ SaleRepo (POS)   │   │   _schema    │   │    │
//! │  │   │               │   │ EscrowRepo ...   │   │              │   │    │
//! │  │   └───────────────┘   └──────────────────┘   └──────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (NANOTRADE_DATABASE_PATH, default ./nanotrade.db)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per aggregate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nanotrade_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("nanotrade.db")).await?;
//! let products = db.products().list_by_shop(&shop_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::business::BusinessRepository;
pub use repository::catalog::{CategoryRepository, SupplierRepository};
pub use repository::commerce::{CustomerRepository, ExpenseRepository, OrderRepository};
pub use repository::employee::EmployeeRepository;
pub use repository::escrow::EscrowRepository;
pub use repository::inventory::{InventoryRepository, MovementRequest};
pub use repository::ledger::{InvoiceRepository, TransactionRepository};
pub use repository::product::ProductRepository;
pub use repository::sale::{CheckoutLine, CheckoutRequestData, SaleRepository};
pub use repository::shop::ShopRepository;
pub use repository::token::TokenRepository;
pub use repository::user::UserRepository;
pub use repository::warehouse::WarehouseRepository;
