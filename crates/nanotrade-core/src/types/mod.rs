//! # Domain Types
//!
//! Core domain types used throughout NanoTrade.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Entities                                 │
//! │                                                                         │
//! │  User ──owns──► BusinessInformation ──has──► Shop ◄──works at── Employee│
//! │                                               │                         │
//! │          ┌───────────────┬────────────────────┼──────────────┐          │
//! │          ▼               ▼                    ▼              ▼          │
//! │      Category        Supplier            Warehouse       Customer       │
//! │          │               │                    │                         │
//! │          ▼               │                    ▼                         │
//! │       Product ◄──────────┴──────────────► Inventory ──► StockMovement   │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   Sale ─► SaleItem     Sale ─► Invoice ─► Payment ─► Transaction        │
//! │                        Sale ─► Escrow                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has:
//! - `id`: UUID v4 string, immutable, used for relations
//! - a business key where one exists (sku, receipt_number, escrow reference)
//!
//! Request and response bodies shared by the server and the client live in
//! [`payloads`].

mod account;
mod catalog;
mod inventory;
pub mod payloads;
mod sales;

pub use account::*;
pub use catalog::*;
pub use inventory::*;
pub use payloads::*;
pub use sales::*;

use uuid::Uuid;

/// Generates a new entity id (UUID v4).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
