//! # nanotrade-core: Pure Business Logic for NanoTrade
//!
//! This crate holds every business rule of the NanoTrade retail system as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        NanoTrade Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Web front-end / nanotrade-client                      │   │
//! │  │    Catalog screens ──► POS cart ──► Checkout ──► Escrow view    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST /api/v1 (Token auth)              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    api-server (axum handlers)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ nanotrade-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   types   money   stock   cart   listing   escrow   roles       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                nanotrade-db (SQLite repositories)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Shop, Product, Inventory, Sale, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`stock`] - Stock status derivation, movements and reorder rules
//! - [`cart`] - Point-of-sale cart
//! - [`listing`] - Search, pagination and multi-select for list screens
//! - [`escrow`] - Escrow state machine and summary
//! - [`roles`] - Role based permissions
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use nanotrade_core::stock::StockStatus;
//!
//! assert_eq!(StockStatus::derive(0, 10), StockStatus::OutOfStock);
//! assert_eq!(StockStatus::derive(7, 10), StockStatus::LowStock);
//! assert_eq!(StockStatus::derive(42, 10), StockStatus::InStock);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod escrow;
pub mod listing;
pub mod money;
pub mod roles;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use escrow::{EscrowState, EscrowSummary};
pub use listing::{Page, Searchable, Selection};
pub use money::Money;
pub use roles::{Permission, UserRole};
pub use stock::{MovementType, StockLevel, StockStatus};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of distinct lines in a single POS cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a POS cart.
///
/// Guards against typing 1000 instead of 10 at the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest price or cost accepted for a product, in minor units
/// (10 billion in major units).
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000_000;

/// Largest quantity a single stock movement may carry.
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000_000;

/// Reorder level given to products created without one.
pub const DEFAULT_REORDER_LEVEL: i64 = 10;

/// Currency the seeded shops trade in (Central African CFA franc).
pub const DEFAULT_CURRENCY: &str = "XAF";

/// Page size used by list endpoints when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;
