//! # POS Ledger
//!
//! A single-terminal retail point-of-sale engine: a product catalog with
//! stock levels, cashier sales with stock reserved as items are punched in,
//! and an append-only sales ledger aggregated into revenue reports.
//!
//! ## Design Principles
//!
//! - **Fixed-point money**: 2 decimal places via `rust_decimal`
//! - **Flat files**: `inventory.txt` and `sales_history.txt`, fully rewritten
//!   after every mutation
//! - **Lenient loading**: malformed lines are logged and skipped
//! - **Deterministic output**: products always in ascending ID order
//!
//! ## Example
//!
//! ```no_run
//! use pos_ledger::{LedgerFiles, Store};
//!
//! let (store, report) = Store::open(LedgerFiles::in_dir("data")).unwrap();
//! println!("{} products, {} sales", store.catalog().len(), store.history().len());
//! println!("{} inventory lines skipped", report.inventory_skipped.len());
//! ```

pub mod app;
pub mod auth;
pub mod catalog;
pub mod clock;
pub mod codec;
pub mod console;
pub mod error;
pub mod files;
pub mod ids;
pub mod money;
pub mod product;
pub mod report;
pub mod sale;
pub mod store;
pub mod workflow;

pub use app::App;
pub use auth::{AdminKey, Authorizer, DEFAULT_ADMIN_KEY};
pub use catalog::{Catalog, EditRejection, ProductEdit};
pub use clock::{Clock, FixedClock, LocalClock};
pub use console::Console;
pub use error::{LedgerError, Result};
pub use files::LedgerFiles;
pub use ids::{IdSource, UuidIdSource};
pub use money::Money;
pub use product::{Product, StockStatus};
pub use report::{aggregate, ReportRow, SalesReport, SalesSummary};
pub use sale::{Sale, SaleLineItem};
pub use store::{LoadReport, Store};
pub use workflow::{resolve, ProductQuery, Resolution, SaleSession, SaleState};
