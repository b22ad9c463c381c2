//! `inventory.txt`: one product per line.
//!
//! ```text
//! <id> <name>|<quantity> <price>
//! 482913 Apple Juice 1L|45 10.00
//! ```

use super::{Decoded, SkipReason};
use crate::catalog::Catalog;
use crate::money::Money;
use crate::product::Product;
use std::io::{self, Write};
use std::str::FromStr;

/// Writes every product in ID order.
pub fn encode<W: Write>(catalog: &Catalog, mut writer: W) -> io::Result<()> {
    for p in catalog.iter() {
        writeln!(writer, "{} {}|{} {}", p.id, p.name, p.quantity, p.price)?;
    }
    writer.flush()
}

/// Encodes the catalog into a `String`.
pub fn encode_to_string(catalog: &Catalog) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = encode(catalog, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Decodes products, skipping blank lines silently and malformed lines with
/// a recorded reason. A malformed line never yields a partial product.
pub fn decode(text: &str) -> Decoded<Product> {
    let mut decoded = Decoded::default();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match decode_line(line) {
            Ok(product) => decoded.items.push(product),
            Err(reason) => decoded.skip(idx + 1, line, reason),
        }
    }

    decoded
}

fn decode_line(line: &str) -> Result<Product, SkipReason> {
    let rest = line.trim_start();
    let (id, rest) = match rest.find(char::is_whitespace) {
        Some(end) => (&rest[..end], &rest[end..]),
        None => (rest, ""),
    };

    let (name, rest) = rest
        .trim_start()
        .split_once('|')
        .ok_or(SkipReason::MissingDelimiter("|"))?;

    let mut tokens = rest.split_whitespace();

    let qty_token = tokens.next().ok_or(SkipReason::MissingField("quantity"))?;
    let quantity = qty_token
        .parse::<u32>()
        .map_err(|_| SkipReason::InvalidQuantity(qty_token.to_string()))?;

    let price_token = tokens.next().ok_or(SkipReason::MissingField("price"))?;
    let price = Money::from_str(price_token)
        .map_err(|_| SkipReason::InvalidPrice(price_token.to_string()))?;

    Product::new(id, name, quantity, price).map_err(|e| SkipReason::InvalidProduct(e.to_string()))
}
