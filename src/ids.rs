//! 6-digit product and receipt identifiers.
//!
//! IDs are drawn from `100000..=999999`. Collisions are possible by
//! construction, so callers re-roll against the IDs already in use.

use crate::error::{LedgerError, Result};
use log::debug;

/// Smallest ID value.
pub const ID_MIN: u32 = 100_000;

/// Number of distinct IDs.
pub const ID_SPACE: u32 = 900_000;

/// Attempts made by [`unique_id`] before giving up.
pub const MAX_ATTEMPTS: usize = 10_000;

/// A source of candidate IDs. Not required to be unique or unpredictable.
pub trait IdSource {
    /// Returns a number in `ID_MIN..ID_MIN + ID_SPACE`.
    fn next_candidate(&mut self) -> u32;
}

/// Candidates taken from the random bits of v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn next_candidate(&mut self) -> u32 {
        let bits = uuid::Uuid::new_v4().as_u128();
        // Remainder is below ID_SPACE, so the cast is lossless.
        ID_MIN + (bits % u128::from(ID_SPACE)) as u32
    }
}

/// Draws candidates until `taken` rejects none, re-rolling on collision.
pub fn unique_id<F>(source: &mut dyn IdSource, taken: F) -> Result<String>
where
    F: Fn(&str) -> bool,
{
    for attempt in 1..=MAX_ATTEMPTS {
        let id = source.next_candidate().to_string();
        if !taken(&id) {
            return Ok(id);
        }
        debug!("ID {} already in use (attempt {}), re-rolling", id, attempt);
    }
    Err(LedgerError::IdSpaceExhausted(MAX_ATTEMPTS))
}
