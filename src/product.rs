//! Product model and stock operations.
//!
//! Maintains the invariant: `quantity >= 0` at all times (enforced by `u32`
//! plus checked reservation).

use crate::error::{LedgerError, Result};
use crate::money::Money;
use serde::Serialize;

/// Stock level below which a product is shown as low stock.
pub const LOW_STOCK_THRESHOLD: u32 = 21;

/// Stock level at or above which a product is shown as fully stocked.
pub const FULL_STOCK_THRESHOLD: u32 = 100;

/// Highest accepted unit price, in cents ($1,000,000,000.00).
///
/// Keeps `price * u32::MAX` and report totals well inside `Decimal` range.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// A product in the catalog.
///
/// # Invariants
///
/// - `id` is a unique 6-digit string
/// - `name` is non-empty and never contains `|` once persisted
/// - `price` is strictly positive and at most [`MAX_PRICE_CENTS`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: String,

    /// Display name; may contain spaces.
    pub name: String,

    /// Units on hand, net of units reserved by open sales.
    pub quantity: u32,

    /// Current unit price. Historical receipts are priced with this value.
    pub price: Money,
}

/// Display bucket for a product's stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    OutOfStock,
    Low,
    Medium,
    Full,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::Low => "Low Stock",
            StockStatus::Medium => "Medium Stock",
            StockStatus::Full => "Full Stock",
        };
        f.write_str(label)
    }
}

impl Product {
    /// Creates a product after validating name and price.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        price: Money,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        validate_price(price)?;
        Ok(Product {
            id: id.into(),
            name,
            quantity,
            price,
        })
    }

    /// Takes `qty` units out of stock for an open sale.
    ///
    /// Fails with `InsufficientStock` if `qty` exceeds the current quantity;
    /// in that case the quantity is left untouched.
    pub fn reserve(&mut self, qty: u32) -> Result<()> {
        if qty > self.quantity {
            return Err(LedgerError::InsufficientStock {
                product_id: self.id.clone(),
                requested: qty,
                available: self.quantity,
            });
        }

        self.quantity -= qty;
        Ok(())
    }

    /// Puts previously reserved units back. Fails only if the result would
    /// not fit in a `u32`, leaving the quantity untouched.
    pub fn release(&mut self, qty: u32) -> Result<()> {
        self.quantity = self.checked_stock(qty)?;
        Ok(())
    }

    /// Adds delivered stock. `qty` must be positive.
    pub fn refill(&mut self, qty: u32) -> Result<()> {
        if qty == 0 {
            return Err(LedgerError::Validation(
                "Quantity to add must be positive".to_string(),
            ));
        }

        self.quantity = self.checked_stock(qty)?;
        Ok(())
    }

    fn checked_stock(&self, qty: u32) -> Result<u32> {
        self.quantity.checked_add(qty).ok_or_else(|| {
            LedgerError::Validation(format!(
                "Stock for {} cannot exceed {} units",
                self.id,
                u32::MAX
            ))
        })
    }

    /// Returns the stock bucket used by inventory listings.
    pub fn status(&self) -> StockStatus {
        match self.quantity {
            0 => StockStatus::OutOfStock,
            q if q < LOW_STOCK_THRESHOLD => StockStatus::Low,
            q if q >= FULL_STOCK_THRESHOLD => StockStatus::Full,
            _ => StockStatus::Medium,
        }
    }
}

/// Rejects empty names and names the inventory format cannot hold.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Product name cannot be empty".to_string(),
        ));
    }
    if name.contains('|') || name.contains('\n') {
        return Err(LedgerError::Validation(
            "Product name cannot contain '|' or line breaks".to_string(),
        ));
    }
    Ok(())
}

/// Rejects zero, negative and out-of-range prices.
pub fn validate_price(price: Money) -> Result<()> {
    if !price.is_positive() {
        return Err(LedgerError::Validation(
            "Price must be greater than 0".to_string(),
        ));
    }
    let max = Money::from_cents(MAX_PRICE_CENTS);
    if price > max {
        return Err(LedgerError::Validation(format!(
            "Price cannot exceed ${}",
            max
        )));
    }
    Ok(())
}
