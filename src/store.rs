//! The store: catalog, sales history and their backing files.
//!
//! Every catalog mutation is followed by a full rewrite of the inventory
//! file; recording a sale rewrites both files. A failed write never rolls
//! back the in-memory change. It is logged and queued so the caller can tell
//! the user that memory and disk have diverged.

use crate::catalog::{Catalog, EditRejection, ProductEdit};
use crate::codec::SkippedLine;
use crate::error::{LedgerError, Result};
use crate::files::LedgerFiles;
use crate::ids::{unique_id, IdSource};
use crate::money::Money;
use crate::product::Product;
use crate::sale::Sale;
use log::{debug, error, info};

/// What was dropped while loading the ledger files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub inventory_skipped: Vec<SkippedLine>,
    pub history_skipped: Vec<SkippedLine>,
}

/// Owns all mutable state of a session.
///
/// There is a single owner and no interior mutability; workflows borrow the
/// store mutably for the duration of each operation.
pub struct Store {
    catalog: Catalog,

    /// Finalized sales, oldest first.
    history: Vec<Sale>,

    /// `None` keeps everything in memory.
    files: Option<LedgerFiles>,

    /// Persistence failures not yet shown to the user.
    write_failures: Vec<LedgerError>,
}

impl Store {
    /// Creates an empty store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Store {
            catalog: Catalog::new(),
            history: Vec::new(),
            files: None,
            write_failures: Vec::new(),
        }
    }

    /// Creates an in-memory store pre-filled with a catalog.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Store {
            catalog,
            ..Store::in_memory()
        }
    }

    /// Loads both files. Malformed lines are dropped and listed in the report;
    /// missing files start empty.
    pub fn open(files: LedgerFiles) -> Result<(Self, LoadReport)> {
        let inventory = files.load_inventory()?;
        let history = files.load_sales_history()?;

        let report = LoadReport {
            inventory_skipped: inventory.skipped,
            history_skipped: history.skipped,
        };

        let store = Store {
            catalog: inventory.items.into_iter().collect(),
            history: history.items,
            files: Some(files),
            write_failures: Vec::new(),
        };

        info!(
            "Opened store with {} product(s) and {} sale(s)",
            store.catalog.len(),
            store.history.len()
        );

        Ok((store, report))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Finalized sales, oldest first.
    pub fn history(&self) -> &[Sale] {
        &self.history
    }

    pub fn files(&self) -> Option<&LedgerFiles> {
        self.files.as_ref()
    }

    /// Creates a product under a fresh 6-digit ID.
    pub fn add_product(
        &mut self,
        name: impl Into<String>,
        quantity: u32,
        price: Money,
        ids: &mut dyn IdSource,
    ) -> Result<Product> {
        let catalog = &self.catalog;
        let id = unique_id(ids, |id| catalog.contains(id))?;
        let product = Product::new(id, name, quantity, price)?;

        self.catalog.upsert(product.clone());
        debug!("Added product {} ({})", product.id, product.name);
        self.persist_inventory();
        Ok(product)
    }

    /// Inserts or replaces a product by ID.
    pub fn upsert(&mut self, product: Product) -> Option<Product> {
        let replaced = self.catalog.upsert(product);
        self.persist_inventory();
        replaced
    }

    /// Reserves stock for an open sale.
    pub fn reserve(&mut self, id: &str, qty: u32) -> Result<()> {
        self.catalog.reserve(id, qty)?;
        self.persist_inventory();
        Ok(())
    }

    /// Restores reserved stock.
    pub fn release(&mut self, id: &str, qty: u32) -> Result<()> {
        self.catalog.release(id, qty)?;
        self.persist_inventory();
        Ok(())
    }

    /// Adds delivered stock, returning the updated product.
    pub fn refill(&mut self, id: &str, qty: u32) -> Result<Product> {
        let product = self.catalog.refill(id, qty)?.clone();
        self.persist_inventory();
        Ok(product)
    }

    /// Edits a product field by field; see [`Catalog::edit`].
    pub fn edit(&mut self, id: &str, edit: ProductEdit) -> Result<Vec<EditRejection>> {
        let rejected = self.catalog.edit(id, edit)?;
        self.persist_inventory();
        Ok(rejected)
    }

    /// Returns `true` if a finalized sale already uses this receipt ID.
    pub fn has_receipt(&self, receipt_id: &str) -> bool {
        self.history.iter().any(|s| s.receipt_id == receipt_id)
    }

    /// Appends a finalized sale and rewrites both files.
    pub fn record_sale(&mut self, sale: Sale) {
        info!(
            "Recorded sale {} for {} ({} unit(s), total ${})",
            sale.receipt_id,
            sale.customer_name,
            sale.units(),
            sale.total_amount
        );
        self.history.push(sale);
        self.persist_history();
        self.persist_inventory();
    }

    /// Rewrites the inventory file now.
    pub fn persist_inventory(&mut self) {
        if let Some(files) = &self.files {
            if let Err(e) = files.save_inventory(&self.catalog) {
                error!("{}", e);
                self.write_failures.push(e);
            }
        }
    }

    fn persist_history(&mut self) {
        if let Some(files) = &self.files {
            if let Err(e) = files.save_sales_history(&self.history, &self.catalog) {
                error!("{}", e);
                self.write_failures.push(e);
            }
        }
    }

    /// Drains persistence failures recorded since the last call.
    pub fn take_write_failures(&mut self) -> Vec<LedgerError> {
        std::mem::take(&mut self.write_failures)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}
