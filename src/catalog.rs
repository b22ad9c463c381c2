//! In-memory product catalog with stock reservation.
//!
//! Products are keyed by ID in a `BTreeMap`, so iteration (and therefore the
//! persisted inventory file) is always in ascending ID order.

use crate::error::{LedgerError, Result};
use crate::money::Money;
use crate::product::{validate_name, validate_price, Product};
use log::debug;
use std::collections::BTreeMap;
use thiserror::Error;

/// Requested changes to a product. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductEdit {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Money>,
}

/// A single field of a `ProductEdit` that was refused. The old value is kept.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditRejection {
    #[error("Name must be non-empty and cannot contain '|'. Value not changed.")]
    InvalidName(String),

    #[error("Quantity cannot be negative. Value not changed.")]
    NegativeQuantity(i64),

    #[error("Quantity out of range. Value not changed.")]
    QuantityOutOfRange(i64),

    #[error("Price ${0} must be above 0.00 and at most 1000000000.00. Value not changed.")]
    InvalidPrice(Money),
}

/// The set of known products and their stock levels.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: BTreeMap<String, Product>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Catalog {
            products: BTreeMap::new(),
        }
    }

    /// Inserts or replaces a product by ID, returning the replaced one.
    pub fn upsert(&mut self, product: Product) -> Option<Product> {
        self.products.insert(product.id.clone(), product)
    }

    /// Looks up a product by exact ID.
    pub fn find(&self, id: &str) -> Result<&Product> {
        self.products
            .get(id)
            .ok_or_else(|| LedgerError::ProductNotFound(id.to_string()))
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Product> {
        self.products
            .get_mut(id)
            .ok_or_else(|| LedgerError::ProductNotFound(id.to_string()))
    }

    /// Case-insensitive containment match over product names, in ID order.
    pub fn find_by_name(&self, term: &str) -> Vec<&Product> {
        let needle = term.to_lowercase();
        self.products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Current unit price of a product, if it is still in the catalog.
    pub fn price_of(&self, id: &str) -> Option<Money> {
        self.products.get(id).map(|p| p.price)
    }

    /// Returns `true` if a product with this ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.products.contains_key(id)
    }

    /// Decrements stock for an open sale; fails with `InsufficientStock`
    /// rather than letting quantity go negative.
    pub fn reserve(&mut self, id: &str, qty: u32) -> Result<()> {
        self.find_mut(id)?.reserve(qty)?;
        debug!("Reserved {} x {}", qty, id);
        Ok(())
    }

    /// Restores previously reserved stock.
    pub fn release(&mut self, id: &str, qty: u32) -> Result<()> {
        self.find_mut(id)?.release(qty)?;
        debug!("Released {} x {}", qty, id);
        Ok(())
    }

    /// Adds delivered stock; `qty` must be positive.
    pub fn refill(&mut self, id: &str, qty: u32) -> Result<&Product> {
        let product = self.find_mut(id)?;
        product.refill(qty)?;
        debug!("Refilled {} by {} to {}", id, qty, product.quantity);
        Ok(product)
    }

    /// Applies an edit field by field.
    ///
    /// Invalid fields are skipped and reported; the remaining fields are still
    /// applied. Fails only if the product does not exist.
    pub fn edit(&mut self, id: &str, edit: ProductEdit) -> Result<Vec<EditRejection>> {
        let product = self.find_mut(id)?;
        let mut rejected = Vec::new();

        if let Some(name) = edit.name {
            match validate_name(&name) {
                Ok(()) => product.name = name,
                Err(_) => rejected.push(EditRejection::InvalidName(name)),
            }
        }

        if let Some(quantity) = edit.quantity {
            if quantity < 0 {
                rejected.push(EditRejection::NegativeQuantity(quantity));
            } else {
                match u32::try_from(quantity) {
                    Ok(q) => product.quantity = q,
                    Err(_) => rejected.push(EditRejection::QuantityOutOfRange(quantity)),
                }
            }
        }

        if let Some(price) = edit.price {
            match validate_price(price) {
                Ok(()) => product.price = price,
                Err(_) => rejected.push(EditRejection::InvalidPrice(price)),
            }
        }

        debug!("Edited {} ({} field(s) rejected)", id, rejected.len());
        Ok(rejected)
    }

    /// Iterates products in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<Product> for Catalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for product in iter {
            catalog.upsert(product);
        }
        catalog
    }
}
