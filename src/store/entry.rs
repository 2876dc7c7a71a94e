//! Store Entry Module
//!
//! Defines individual store entries with optional expiry.

use std::time::Duration;

use tokio::time::Instant;

// == Entry Value ==
/// Payload of a store entry: either a scalar byte string or a list.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    /// Scalar value (strings, numbers and counters are all bytes)
    Bytes(Vec<u8>),
    /// Ordered list of byte values
    List(Vec<Vec<u8>>),
}

// == Entry ==
/// A single store entry with value and expiry deadline.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub value: EntryValue,
    /// Expiry deadline, None = no expiration
    pub expires_at: Option<Instant>,
}

impl Entry {
    // == Constructor ==
    /// Creates a new entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Optional time-to-live measured from now
    pub fn new(value: EntryValue, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its deadline. Entries without a deadline never expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Instant::now() >= expires,
            None => false,
        }
    }
}
