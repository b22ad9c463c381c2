//! `sales_history.txt`: one receipt block per finalized sale.
//!
//! ```text
//! Receipt ID: 731204
//! Customer Name: Ada
//! Date and Time: 2024-05-01 14:03:22
//! Sales Record:
//! 482913|Apple Juice 1L x5 @ $10.00 = $50.00
//! ----------------------------------------
//! Total Amount: $50.00
//! Customer Cash: $50.00
//! Change: $0.00
//! ========================================
//!
//! ```
//!
//! Item lines are rendered with the product's *current* catalog name and
//! price; no price is stored on the sale itself.

use super::{Decoded, SkipReason};
use crate::catalog::Catalog;
use crate::money::Money;
use crate::sale::{Sale, SaleLineItem};
use std::io::{self, Write};
use std::iter::Peekable;
use std::str::FromStr;

/// Line closing the item list of a receipt.
pub const ITEMS_SEPARATOR: &str = "----------------------------------------";

/// Line closing a receipt block.
pub const RECORD_END: &str = "========================================";

const RECEIPT_LABEL: &str = "Receipt ID:";
const TOTAL_LABEL: &str = "Total Amount:";

/// Writes every sale as a receipt block.
pub fn encode<W: Write>(sales: &[Sale], catalog: &Catalog, mut writer: W) -> io::Result<()> {
    for sale in sales {
        encode_sale(sale, catalog, &mut writer)?;
    }
    writer.flush()
}

/// Encodes the sales into a `String`.
pub fn encode_to_string(sales: &[Sale], catalog: &Catalog) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = encode(sales, catalog, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn encode_sale<W: Write>(sale: &Sale, catalog: &Catalog, w: &mut W) -> io::Result<()> {
    writeln!(w, "Receipt ID: {}", sale.receipt_id)?;
    writeln!(w, "Customer Name: {}", sale.customer_name)?;
    writeln!(w, "Date and Time: {}", sale.timestamp)?;
    writeln!(w, "Sales Record:")?;

    for item in &sale.line_items {
        match catalog.find(&item.product_id) {
            Ok(p) => writeln!(
                w,
                "{}|{} x{} @ ${} = ${}",
                item.product_id,
                p.name,
                item.quantity,
                p.price,
                p.price * item.quantity
            )?,
            Err(_) => writeln!(
                w,
                "{}|Unknown Product x{} @ $0.00 = $0.00",
                item.product_id, item.quantity
            )?,
        }
    }

    writeln!(w, "{}", ITEMS_SEPARATOR)?;
    writeln!(w, "Total Amount: ${}", sale.total_amount)?;
    writeln!(w, "Customer Cash: ${}", sale.customer_cash)?;
    writeln!(w, "Change: ${}", sale.change)?;
    writeln!(w, "{}", RECORD_END)?;
    writeln!(w)
}

/// Decodes receipt blocks.
///
/// Recovery is positional: the three header lines follow `Receipt ID:`, item
/// lines run until the dash separator or a blank line, and the three amounts
/// follow. Unreadable item lines are dropped from their sale; an amount line
/// without `$` leaves that amount at zero. A receipt header encountered where
/// a fixed-position line was expected starts a new block instead of being
/// swallowed.
pub fn decode(text: &str) -> Decoded<Sale> {
    let mut decoded = Decoded::default();
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l)).peekable();

    while let Some((_, line)) = lines.next() {
        if !line.contains(RECEIPT_LABEL) {
            continue;
        }

        let mut sale = Sale::open(field_value(line));
        sale.customer_name = next_in_block(&mut lines)
            .map(|(_, l)| field_value(l))
            .unwrap_or_default();
        sale.timestamp = next_in_block(&mut lines)
            .map(|(_, l)| field_value(l))
            .unwrap_or_default();

        // "Sales Record:" header
        next_in_block(&mut lines);

        let mut closed_by_separator = false;
        while let Some(&(no, l)) = lines.peek() {
            if l.contains(RECEIPT_LABEL) {
                break;
            }
            lines.next();
            if l.contains(ITEMS_SEPARATOR) {
                closed_by_separator = true;
                break;
            }
            if l.is_empty() {
                break;
            }
            match decode_item(l) {
                Ok(item) => sale.line_items.push(item),
                Err(reason) => decoded.skip(no, l, reason),
            }
        }

        let total_line = if closed_by_separator {
            next_in_block(&mut lines)
        } else {
            seek_totals(&mut lines)
        };

        if let Some(total_line) = total_line {
            sale.total_amount = read_amount(total_line, &mut decoded);
            sale.customer_cash = next_in_block(&mut lines)
                .map(|l| read_amount(l, &mut decoded))
                .unwrap_or_default();
            sale.change = next_in_block(&mut lines)
                .map(|l| read_amount(l, &mut decoded))
                .unwrap_or_default();
        }

        decoded.items.push(sale);
    }

    decoded
}

/// Next line of the current block, unless the next line opens another receipt.
fn next_in_block<'a, I>(lines: &mut Peekable<I>) -> Option<(usize, &'a str)>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    match lines.peek() {
        Some(&(_, l)) if l.contains(RECEIPT_LABEL) => None,
        _ => lines.next(),
    }
}

/// After an item list that ended without a separator, scan forward to the
/// `Total Amount:` line. Stops at the end of the block.
fn seek_totals<'a, I>(lines: &mut Peekable<I>) -> Option<(usize, &'a str)>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    while let Some(entry) = next_in_block(lines) {
        if entry.1.contains(TOTAL_LABEL) {
            return Some(entry);
        }
        if entry.1.contains(RECORD_END) {
            return None;
        }
    }
    None
}

/// Value after the first `:`, minus one leading space. Empty if there is no `:`.
fn field_value(line: &str) -> String {
    match line.split_once(':') {
        Some((_, value)) => value.strip_prefix(' ').unwrap_or(value).to_string(),
        None => String::new(),
    }
}

fn read_amount<T>((no, line): (usize, &str), decoded: &mut Decoded<T>) -> Money {
    let Some(pos) = line.find('$') else {
        return Money::ZERO;
    };

    match Money::from_str(&line[pos + 1..]) {
        Ok(amount) => amount,
        Err(_) => {
            decoded.skip(no, line, SkipReason::InvalidAmount(line[pos + 1..].to_string()));
            Money::ZERO
        }
    }
}

/// Parses `<productID>|<name> x<qty> @ $<unit> = $<total>`.
///
/// The quantity marker is the last ` x` before the last ` @ $`, so names that
/// themselves contain ` x` still decode.
fn decode_item(line: &str) -> Result<SaleLineItem, SkipReason> {
    let bar = line.find('|').ok_or(SkipReason::MissingDelimiter("|"))?;
    let at = line
        .rfind(" @ $")
        .filter(|&at| at > bar)
        .ok_or(SkipReason::MissingDelimiter(" @ $"))?;
    let x = line[bar + 1..at]
        .rfind(" x")
        .map(|offset| bar + 1 + offset)
        .ok_or(SkipReason::MissingDelimiter(" x"))?;

    let product_id = line[..bar].trim();
    if product_id.is_empty() {
        return Err(SkipReason::EmptyProductId);
    }

    let qty_text = line[x + 2..at].trim();
    let quantity = qty_text
        .parse::<u32>()
        .ok()
        .filter(|&q| q > 0)
        .ok_or_else(|| SkipReason::InvalidQuantity(qty_text.to_string()))?;

    Ok(SaleLineItem::new(product_id, quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::Product;

    fn catalog() -> Catalog {
        [
            Product::new("482913", "Apple Juice 1L", 45, Money::from_cents(1000)).unwrap(),
            Product::new("100200", "Box xl", 3, Money::from_cents(199)).unwrap(),
        ]
        .into_iter()
        .collect()
    }

    fn sale() -> Sale {
        Sale {
            receipt_id: "731204".to_string(),
            customer_name: "Ada Lovelace".to_string(),
            line_items: vec![SaleLineItem::new("482913", 5)],
            total_amount: Money::from_cents(5000),
            customer_cash: Money::from_cents(5000),
            change: Money::ZERO,
            timestamp: "2024-05-01 14:03:22".to_string(),
        }
    }

    const BLOCK: &str = "Receipt ID: 731204
Customer Name: Ada Lovelace
Date and Time: 2024-05-01 14:03:22
Sales Record:
482913|Apple Juice 1L x5 @ $10.00 = $50.00
----------------------------------------
Total Amount: $50.00
Customer Cash: $50.00
Change: $0.00
========================================

";

    #[test]
    fn test_encode_exact_format() {
        assert_eq!(encode_to_string(&[sale()], &catalog()), BLOCK);
    }

    #[test]
    fn test_encode_uses_current_price() {
        let mut catalog = catalog();
        catalog.upsert(Product::new("482913", "Apple Juice 1L", 45, Money::from_cents(1200)).unwrap());
        let text = encode_to_string(&[sale()], &catalog);
        assert!(text.contains("482913|Apple Juice 1L x5 @ $12.00 = $60.00\n"));
        assert!(text.contains("Total Amount: $50.00\n"));
    }

    #[test]
    fn test_encode_unknown_product() {
        let mut s = sale();
        s.line_items.push(SaleLineItem::new("999999", 2));
        let text = encode_to_string(&[s], &catalog());
        assert!(text.contains("999999|Unknown Product x2 @ $0.00 = $0.00\n"));
    }

    #[test]
    fn test_decode_block() {
        let decoded = decode(BLOCK);
        assert!(decoded.is_lossless());
        assert_eq!(decoded.items, vec![sale()]);
    }

    #[test]
    fn test_round_trip_many_sales() {
        let mut second = sale();
        second.receipt_id = "100777".to_string();
        second.customer_name = "Grace".to_string();
        second.line_items = vec![
            SaleLineItem::new("100200", 2),
            SaleLineItem::new("482913", 1),
        ];
        second.total_amount = Money::from_cents(1398);
        second.customer_cash = Money::from_cents(2000);
        second.change = Money::from_cents(602);

        let sales = vec![sale(), second];
        let decoded = decode(&encode_to_string(&sales, &catalog()));
        assert_eq!(decoded.items, sales);
    }

    #[test]
    fn test_decode_drops_malformed_item_lines() {
        let text = BLOCK.replace(
            "482913|Apple Juice 1L x5 @ $10.00 = $50.00\n",
            "482913|Apple Juice 1L x5 @ $10.00 = $50.00\nno markers here\n482913|Juice @ $1.00\n|Nameless x1 @ $1.00 = $1.00\n",
        );
        let decoded = decode(&text);
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(decoded.items[0].line_items, vec![SaleLineItem::new("482913", 5)]);
        let reasons: Vec<_> = decoded.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::MissingDelimiter("|"),
                SkipReason::MissingDelimiter(" x"),
                SkipReason::EmptyProductId,
            ]
        );
        assert_eq!(decoded.skipped[0].line, 6);
    }

    #[test]
    fn test_decode_name_containing_x_marker() {
        let decoded = decode(&BLOCK.replace(
            "482913|Apple Juice 1L x5",
            "100200|Box xl x3",
        ));
        assert_eq!(decoded.items[0].line_items, vec![SaleLineItem::new("100200", 3)]);
    }

    #[test]
    fn test_missing_dollar_leaves_amount_zero() {
        let decoded = decode(&BLOCK.replace("Customer Cash: $50.00", "Customer Cash: fifty"));
        assert_eq!(decoded.items[0].customer_cash, Money::ZERO);
        assert_eq!(decoded.items[0].total_amount, Money::from_cents(5000));
    }

    #[test]
    fn test_item_list_ended_by_blank_line_seeks_totals() {
        let text = BLOCK.replace("----------------------------------------\n", "\nstray\n");
        let decoded = decode(&text);
        assert_eq!(decoded.items[0].line_items.len(), 1);
        assert_eq!(decoded.items[0].total_amount, Money::from_cents(5000));
        assert_eq!(decoded.items[0].customer_cash, Money::from_cents(5000));
    }

    #[test]
    fn test_truncated_block_keeps_partial_sale_and_next_block() {
        let truncated = "Receipt ID: 111111\nCustomer Name: Cut Off\n";
        let text = format!("{}{}", truncated, BLOCK);
        let decoded = decode(&text);
        assert_eq!(decoded.items.len(), 2);
        assert_eq!(decoded.items[0].receipt_id, "111111");
        assert_eq!(decoded.items[0].customer_name, "Cut Off");
        assert!(decoded.items[0].line_items.is_empty());
        assert_eq!(decoded.items[1], sale());
    }

    #[test]
    fn test_empty_input() {
        let decoded = decode("");
        assert!(decoded.items.is_empty());
        assert!(decoded.is_lossless());
    }
}
