//! Sale and line item models.

use crate::catalog::Catalog;
use crate::money::Money;

/// A reservation of stock within a sale.
///
/// Carries no price snapshot: the unit price is always looked up in the
/// catalog at the time a total, receipt or report is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLineItem {
    /// ID of the reserved product
    pub product_id: String,

    /// Reserved units (always > 0)
    pub quantity: u32,
}

impl SaleLineItem {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        SaleLineItem {
            product_id: product_id.into(),
            quantity,
        }
    }

    /// Current catalog price of this line, or `None` if the product is gone.
    pub fn line_total(&self, catalog: &Catalog) -> Option<Money> {
        catalog
            .price_of(&self.product_id)
            .map(|price| price * self.quantity)
    }
}

/// A customer sale, from the open cart through to the finalized receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sale {
    /// 6-digit receipt identifier, assigned when the sale opens
    pub receipt_id: String,

    /// Set once, when payment starts
    pub customer_name: String,

    /// Reserved products, in the order they were punched
    pub line_items: Vec<SaleLineItem>,

    /// Sum of line totals at current prices, fixed at payment
    pub total_amount: Money,

    /// Cash tendered by the customer
    pub customer_cash: Money,

    /// `customer_cash - total_amount`
    pub change: Money,

    /// Local time of payment, `YYYY-MM-DD HH:MM:SS`
    pub timestamp: String,
}

impl Sale {
    /// Creates an empty sale with its receipt ID already assigned.
    pub fn open(receipt_id: impl Into<String>) -> Self {
        Sale {
            receipt_id: receipt_id.into(),
            ..Default::default()
        }
    }

    /// Recomputes the total from current catalog prices. Lines whose product
    /// no longer exists contribute nothing.
    pub fn total_at_current_prices(&self, catalog: &Catalog) -> Money {
        self.line_items
            .iter()
            .filter_map(|item| item.line_total(catalog))
            .sum()
    }

    /// Total number of units across all line items.
    pub fn units(&self) -> u64 {
        self.line_items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Product;

    fn catalog() -> Catalog {
        [
            Product::new("100001", "Milk", 10, Money::from_cents(250)).unwrap(),
            Product::new("200002", "Eggs", 10, Money::from_cents(399)).unwrap(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_open_assigns_receipt_only() {
        let sale = Sale::open("123456");
        assert_eq!(sale.receipt_id, "123456");
        assert!(sale.line_items.is_empty());
        assert!(sale.customer_name.is_empty());
        assert!(sale.total_amount.is_zero());
    }

    #[test]
    fn test_total_uses_current_prices() {
        let mut catalog = catalog();
        let mut sale = Sale::open("123456");
        sale.line_items.push(SaleLineItem::new("100001", 2));
        sale.line_items.push(SaleLineItem::new("200002", 1));
        assert_eq!(sale.total_at_current_prices(&catalog).to_string(), "8.99");

        catalog.upsert(Product::new("100001", "Milk", 10, Money::from_cents(300)).unwrap());
        assert_eq!(sale.total_at_current_prices(&catalog).to_string(), "9.99");
    }

    #[test]
    fn test_missing_product_contributes_nothing() {
        let mut sale = Sale::open("123456");
        sale.line_items.push(SaleLineItem::new("999999", 4));
        sale.line_items.push(SaleLineItem::new("100001", 1));
        assert_eq!(sale.total_at_current_prices(&catalog()).to_string(), "2.50");
        assert_eq!(sale.units(), 5);
    }

    #[test]
    fn test_units_do_not_wrap() {
        let mut sale = Sale::open("123456");
        sale.line_items.push(SaleLineItem::new("100001", u32::MAX));
        sale.line_items.push(SaleLineItem::new("200002", 2));
        assert_eq!(sale.units(), u64::from(u32::MAX) + 2);
    }
}
