//! Aggregated sales report.
//!
//! Quantities come from the ledger; prices come from the catalog as it is
//! now, so historical volume is valued at present-day prices. Products no
//! longer in the catalog are left out.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::money::Money;
use crate::sale::Sale;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Units sold of one product, valued at its current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub product_id: String,
    pub name: String,
    pub quantity_sold: u64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Per-product rollup, ordered by product ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesReport {
    pub rows: Vec<ReportRow>,
    pub grand_total: Money,
}

/// Either a report or an explicit statement that nothing was sold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SalesSummary {
    NoData,
    Report(SalesReport),
}

/// Rolls up every line item in `sales` by product.
pub fn aggregate(sales: &[Sale], catalog: &Catalog) -> SalesSummary {
    let mut volumes: BTreeMap<&str, u64> = BTreeMap::new();

    for item in sales.iter().flat_map(|s| &s.line_items) {
        if !catalog.contains(&item.product_id) {
            continue;
        }
        *volumes.entry(item.product_id.as_str()).or_default() += u64::from(item.quantity);
    }

    let rows: Vec<ReportRow> = volumes
        .into_iter()
        .filter_map(|(id, quantity_sold)| {
            let product = catalog.find(id).ok()?;
            let subtotal =
                Money::new(product.price.as_decimal() * Decimal::from(quantity_sold));
            Some(ReportRow {
                product_id: id.to_string(),
                name: product.name.clone(),
                quantity_sold,
                unit_price: product.price,
                subtotal,
            })
        })
        .collect();

    if rows.is_empty() {
        return SalesSummary::NoData;
    }

    let grand_total = rows.iter().map(|r| r.subtotal).sum();
    SalesSummary::Report(SalesReport { rows, grand_total })
}

impl SalesReport {
    /// Writes the rows as CSV with a header line.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for SalesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(85);
        writeln!(
            f,
            "{:<10}{:<30}{:<15}{:<15}{:<15}",
            "ID", "Product Name", "Qty Sold", "Unit Price", "Subtotal"
        )?;
        writeln!(f, "{}", rule)?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<10}{:<30}{:<15}${:<14}${:<14}",
                row.product_id,
                row.name,
                row.quantity_sold,
                row.unit_price.to_string(),
                row.subtotal.to_string()
            )?;
        }
        writeln!(f, "{}", rule)?;
        write!(f, "{:>70}${}", "Grand Total Revenue: ", self.grand_total)
    }
}

impl fmt::Display for SalesSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SalesSummary::NoData => f.write_str("No sales data available to report."),
            SalesSummary::Report(report) => write!(f, "{}", report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Product;
    use crate::sale::SaleLineItem;

    fn catalog() -> Catalog {
        [
            Product::new("100001", "Milk", 10, Money::from_cents(1000)).unwrap(),
            Product::new("200002", "Eggs", 10, Money::from_cents(250)).unwrap(),
        ]
        .into_iter()
        .collect()
    }

    fn sale(receipt: &str, items: &[(&str, u32)]) -> Sale {
        let mut s = Sale::open(receipt);
        s.line_items = items
            .iter()
            .map(|(id, q)| SaleLineItem::new(*id, *q))
            .collect();
        s
    }

    #[test]
    fn test_aggregates_across_sales() {
        let sales = vec![sale("111111", &[("100001", 2)]), sale("222222", &[("100001", 3)])];
        match aggregate(&sales, &catalog()) {
            SalesSummary::Report(r) => {
                assert_eq!(r.rows.len(), 1);
                assert_eq!(r.rows[0].quantity_sold, 5);
                assert_eq!(r.rows[0].subtotal.to_string(), "50.00");
                assert_eq!(r.grand_total.to_string(), "50.00");
            }
            SalesSummary::NoData => panic!("Expected a report"),
        }
    }

    #[test]
    fn test_missing_products_are_excluded() {
        let sales = vec![sale("111111", &[("999999", 7), ("200002", 2)])];
        let SalesSummary::Report(r) = aggregate(&sales, &catalog()) else {
            panic!("Expected a report");
        };
        assert_eq!(r.rows.len(), 1);
        assert_eq!(r.rows[0].product_id, "200002");
        assert_eq!(r.grand_total.to_string(), "5.00");
    }

    #[test]
    fn test_no_data() {
        assert_eq!(aggregate(&[], &catalog()), SalesSummary::NoData);
        let only_missing = vec![sale("111111", &[("999999", 1)])];
        assert_eq!(aggregate(&only_missing, &catalog()), SalesSummary::NoData);
        assert_eq!(
            SalesSummary::NoData.to_string(),
            "No sales data available to report."
        );
    }

    #[test]
    fn test_rows_ordered_by_id_and_priced_now() {
        let mut catalog = catalog();
        let sales = vec![sale("111111", &[("200002", 1), ("100001", 1)])];
        catalog.upsert(Product::new("100001", "Milk", 10, Money::from_cents(1100)).unwrap());

        let SalesSummary::Report(r) = aggregate(&sales, &catalog) else {
            panic!("Expected a report");
        };
        let ids: Vec<_> = r.rows.iter().map(|r| r.product_id.as_str()).collect();
        assert_eq!(ids, vec!["100001", "200002"]);
        assert_eq!(r.rows[0].unit_price.to_string(), "11.00");
        assert_eq!(r.grand_total.to_string(), "13.50");
    }

    #[test]
    fn test_csv_output() {
        let sales = vec![sale("111111", &[("100001", 2), ("200002", 4)])];
        let SalesSummary::Report(r) = aggregate(&sales, &catalog()) else {
            panic!("Expected a report");
        };
        let mut out = Vec::new();
        r.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "product_id,name,quantity_sold,unit_price,subtotal\n\
             100001,Milk,2,10.00,20.00\n\
             200002,Eggs,4,2.50,10.00\n"
        );
    }

    #[test]
    fn test_table_contains_grand_total() {
        let sales = vec![sale("111111", &[("100001", 1)])];
        let text = aggregate(&sales, &catalog()).to_string();
        assert!(text.contains("Milk"));
        assert!(text.ends_with("Grand Total Revenue: $10.00"));
    }
}
