//! Text codecs for the two ledger files.
//!
//! Decoding is tolerant but lossy: a line that cannot be read is dropped and
//! recorded in [`Decoded::skipped`] instead of failing the whole load.

pub mod history;
pub mod inventory;

use log::warn;
use thiserror::Error;

/// Why a persisted line was dropped during decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("missing '{0}' delimiter")]
    MissingDelimiter(&'static str),

    #[error("invalid quantity '{0}'")]
    InvalidQuantity(String),

    #[error("invalid price '{0}'")]
    InvalidPrice(String),

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("empty product ID")]
    EmptyProductId,

    #[error("{0}")]
    InvalidProduct(String),
}

/// A dropped input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the source text
    pub line: usize,
    pub content: String,
    pub reason: SkipReason,
}

/// Result of decoding a ledger file: what was recovered and what was lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedLine>,
}

impl<T> Default for Decoded<T> {
    fn default() -> Self {
        Decoded {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Decoded<T> {
    /// Returns `true` if no line was dropped.
    pub fn is_lossless(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, line: usize, content: &str, reason: SkipReason) {
        warn!("Line {}: {}, skipping: {:?}", line, reason, content);
        self.skipped.push(SkippedLine {
            line,
            content: content.to_string(),
            reason,
        });
    }
}
