//! Error types for the ledger.

use crate::money::Money;
use crate::workflow::SaleState;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while operating the catalog, a sale or the ledger files.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to read or write a stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A ledger file could not be written; memory keeps the applied change
    #[error("Could not write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bad user input: unparsable number, empty field, out-of-range value
    #[error("{0}")]
    Validation(String),

    /// No product with this ID in the catalog
    #[error("Product with ID '{0}' not found")]
    ProductNotFound(String),

    /// No line item for this product in the current sale
    #[error("Product ID '{0}' not found in current sale")]
    LineItemNotFound(String),

    /// The product has no stock at all
    #[error("Product '{0}' is out of stock")]
    OutOfStock(String),

    /// More units requested than the catalog holds
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },

    /// Payment attempted on a sale with no line items
    #[error("No products in the current sale")]
    EmptyCart,

    /// Tendered cash does not cover the total
    #[error("Insufficient cash: total is ${total}, received ${cash}")]
    InsufficientCash { total: Money, cash: Money },

    /// Authorization check rejected the supplied key
    #[error("Invalid admin key")]
    Unauthorized,

    /// Operation not allowed in the sale's current state
    #[error("Cannot {operation} while sale is {state}")]
    InvalidState {
        operation: &'static str,
        state: SaleState,
    },

    /// The ID generator kept colliding with existing IDs
    #[error("Could not generate a unique ID after {0} attempts")]
    IdSpaceExhausted(usize),

    /// The interactive input stream ended
    #[error("Input closed")]
    InputClosed,
}
