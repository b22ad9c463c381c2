//! Sale state machine.
//!
//! ```text
//! Building ──► AwaitingCustomerName ──► AwaitingPayment ──► Finalized
//!    │                  │                       │
//!    └──────────────────┴───────────────────────┴──────────► Cancelled
//! ```
//!
//! Stock is reserved the moment an item is added and restored the moment it
//! is removed or the sale is cancelled. Only `pay` writes to the ledger.

use crate::auth::Authorizer;
use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::error::{LedgerError, Result};
use crate::ids::{unique_id, IdSource};
use crate::money::Money;
use crate::product::Product;
use crate::sale::{Sale, SaleLineItem};
use crate::store::Store;
use log::{debug, info, warn};
use std::fmt;

/// Where a sale is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleState {
    /// Items can be added and removed.
    Building,
    /// Payment requested; waiting for the customer's name.
    AwaitingCustomerName,
    /// Waiting for enough cash.
    AwaitingPayment,
    /// Paid and appended to the ledger. Terminal.
    Finalized,
    /// Abandoned with all stock restored. Terminal.
    Cancelled,
}

impl SaleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleState::Finalized | SaleState::Cancelled)
    }
}

impl fmt::Display for SaleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SaleState::Building => "building",
            SaleState::AwaitingCustomerName => "awaiting customer name",
            SaleState::AwaitingPayment => "awaiting payment",
            SaleState::Finalized => "finalized",
            SaleState::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// How the cashier identifies a product to add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductQuery {
    /// Exact product ID.
    Id(String),
    /// Case-insensitive name fragment.
    Name(String),
}

/// Outcome of resolving a [`ProductQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NotFound,
    Unique(Product),
    /// Several name matches, in ID order; the cashier picks one by index.
    Ambiguous(Vec<Product>),
}

/// Looks up the product a query refers to. A single name match is selected
/// automatically.
pub fn resolve(catalog: &Catalog, query: &ProductQuery) -> Resolution {
    match query {
        ProductQuery::Id(id) => match catalog.find(id) {
            Ok(p) => Resolution::Unique(p.clone()),
            Err(_) => Resolution::NotFound,
        },
        ProductQuery::Name(term) => {
            let mut matches: Vec<Product> =
                catalog.find_by_name(term).into_iter().cloned().collect();
            match matches.len() {
                0 => Resolution::NotFound,
                1 => Resolution::Unique(matches.remove(0)),
                _ => Resolution::Ambiguous(matches),
            }
        }
    }
}

/// One customer's sale, from empty cart to receipt.
#[derive(Debug, Clone)]
pub struct SaleSession {
    sale: Sale,
    state: SaleState,
}

impl SaleSession {
    /// Opens an empty sale with a receipt ID not already in the ledger.
    pub fn begin(store: &Store, ids: &mut dyn IdSource) -> Result<Self> {
        let receipt_id = unique_id(ids, |id| store.has_receipt(id))?;
        debug!("Opened sale {}", receipt_id);
        Ok(SaleSession {
            sale: Sale::open(receipt_id),
            state: SaleState::Building,
        })
    }

    pub fn state(&self) -> SaleState {
        self.state
    }

    pub fn sale(&self) -> &Sale {
        &self.sale
    }

    pub fn is_empty(&self) -> bool {
        self.sale.line_items.is_empty()
    }

    fn require(&self, expected: SaleState, operation: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(LedgerError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    /// Reserves `qty` units of a product and appends a line item.
    ///
    /// Fails with `OutOfStock` if the product has no stock and with
    /// `InsufficientStock` if `qty` exceeds it; the caller may retry with the
    /// available quantity. Adding the same product twice creates two lines.
    pub fn add_item(&mut self, store: &mut Store, product_id: &str, qty: u32) -> Result<&SaleLineItem> {
        self.require(SaleState::Building, "add items")?;

        let product = store.catalog().find(product_id)?;
        if product.quantity == 0 {
            return Err(LedgerError::OutOfStock(product.name.clone()));
        }
        if qty == 0 {
            return Err(LedgerError::Validation(
                "Quantity must be greater than 0".to_string(),
            ));
        }

        store.reserve(product_id, qty)?;
        self.sale.line_items.push(SaleLineItem::new(product_id, qty));
        debug!("Sale {}: added {} x {}", self.sale.receipt_id, qty, product_id);

        Ok(&self.sale.line_items[self.sale.line_items.len() - 1])
    }

    /// Removes the first line item for `product_id` and restores its stock.
    /// Requires authorization.
    pub fn remove_item(
        &mut self,
        store: &mut Store,
        auth: &dyn Authorizer,
        key: &str,
        product_id: &str,
    ) -> Result<SaleLineItem> {
        self.require(SaleState::Building, "remove items")?;

        if !auth.authorize(key) {
            return Err(LedgerError::Unauthorized);
        }

        let pos = self
            .sale
            .line_items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or_else(|| LedgerError::LineItemNotFound(product_id.to_string()))?;

        let item = self.sale.line_items.remove(pos);
        restore(store, &item);
        debug!(
            "Sale {}: removed {} x {}",
            self.sale.receipt_id, item.quantity, item.product_id
        );
        Ok(item)
    }

    /// Moves from cart-building to payment. Only possible with at least one
    /// line item. Skips the name prompt if a name is already set.
    pub fn proceed_to_payment(&mut self) -> Result<SaleState> {
        self.require(SaleState::Building, "proceed to payment")?;
        if self.is_empty() {
            return Err(LedgerError::EmptyCart);
        }

        self.state = if self.sale.customer_name.is_empty() {
            SaleState::AwaitingCustomerName
        } else {
            SaleState::AwaitingPayment
        };
        Ok(self.state)
    }

    /// Records the customer's name. Must be non-empty.
    pub fn set_customer_name(&mut self, name: &str) -> Result<()> {
        self.require(SaleState::AwaitingCustomerName, "set the customer name")?;

        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "Customer name cannot be empty".to_string(),
            ));
        }

        self.sale.customer_name = name.to_string();
        self.state = SaleState::AwaitingPayment;
        Ok(())
    }

    /// Amount due at current catalog prices.
    pub fn total_due(&self, catalog: &Catalog) -> Money {
        self.sale.total_at_current_prices(catalog)
    }

    /// Finalizes the sale if `cash` covers the total.
    ///
    /// The total is recomputed from current prices, change and timestamp are
    /// fixed, the sale is appended to the ledger and both files are rewritten.
    /// With too little cash the sale stays in `AwaitingPayment`.
    pub fn pay(&mut self, store: &mut Store, cash: Money, clock: &dyn Clock) -> Result<&Sale> {
        self.require(SaleState::AwaitingPayment, "take payment")?;

        let total = self.total_due(store.catalog());
        if cash < total {
            return Err(LedgerError::InsufficientCash { total, cash });
        }

        self.sale.total_amount = total;
        self.sale.customer_cash = cash;
        self.sale.change = cash - total;
        self.sale.timestamp = clock.timestamp();
        self.state = SaleState::Finalized;

        store.record_sale(self.sale.clone());
        Ok(&self.sale)
    }

    /// Abandons the sale, restoring every reservation. Nothing is written to
    /// the ledger. Allowed from any non-terminal state.
    pub fn cancel(&mut self, store: &mut Store) -> Result<()> {
        if self.state.is_terminal() {
            return Err(LedgerError::InvalidState {
                operation: "cancel",
                state: self.state,
            });
        }

        for item in self.sale.line_items.drain(..) {
            restore(store, &item);
        }
        self.state = SaleState::Cancelled;
        store.persist_inventory();
        info!("Sale {} cancelled", self.sale.receipt_id);
        Ok(())
    }
}

fn restore(store: &mut Store, item: &SaleLineItem) {
    if let Err(e) = store.release(&item.product_id, item.quantity) {
        // The product was deleted from the catalog while reserved.
        warn!("Could not restore {} x {}: {}", item.quantity, item.product_id, e);
    }
}
