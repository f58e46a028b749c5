//! # Repository Module
//!
//! One repository per aggregate, each holding a clone of the pool.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                           │
//! │       │                                                                 │
//! │       │  db.inventory().record_movement(&shop_id, &id, &request)        │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                    │
//! │  ├── list_lines(&self, shop_id)                                         │
//! │  ├── create(&self, shop_id, input, performed_by)                        │
//! │  ├── record_movement(&self, shop_id, inventory_id, request)             │
//! │  └── reorder_suggestions(&self, shop_id)                                │
//! │       │                                                                 │
//! │       │  SQL (one transaction per stock change)                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Transactions
//! Every transaction that writes opens with `BEGIN IMMEDIATE` through
//! [`begin_write`]. It holds the write lock from its first read, and a
//! second writer waits on the connection's `busy_timeout` instead of
//! failing with `SQLITE_BUSY` when it tries to upgrade a read lock.
//!
//! ## Shop Scoping
//! Every shop-owned row is read and written with its `shop_id` in the
//! `WHERE` clause. A row of another shop is reported as not found.
//!
//! ## Available Repositories
//!
//! - [`user::UserRepository`], [`token::TokenRepository`] - accounts and logout
//! - [`business::BusinessRepository`], [`shop::ShopRepository`],
//!   [`employee::EmployeeRepository`] - tenancy
//! - [`catalog::CategoryRepository`], [`catalog::SupplierRepository`],
//!   [`product::ProductRepository`] - catalog
//! - [`warehouse::WarehouseRepository`], [`inventory::InventoryRepository`] - stock
//! - [`sale::SaleRepository`] - checkout and cancellation
//! - [`ledger::InvoiceRepository`], [`ledger::TransactionRepository`] - money
//! - [`escrow::EscrowRepository`] - held funds
//! - [`commerce::CustomerRepository`], [`commerce::OrderRepository`],
//!   [`commerce::ExpenseRepository`]

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

pub mod business;
pub mod catalog;
pub mod commerce;
pub mod employee;
pub mod escrow;
pub mod inventory;
pub mod ledger;
pub mod product;
pub mod sale;
pub mod shop;
pub mod token;
pub mod user;
pub mod warehouse;

#[cfg(test)]
pub(crate) mod test_support;

/// Opens a transaction holding the database write lock.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}
