//! Human-traceable order numbers.
//!
//! Format: `S` + UTC `YYYYMMDDHHMMSS` + 6 lowercase hex digits, e.g.
//! `S20240305070809a1b2c3`. Uniqueness is enforced by the order store,
//! not here.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

const PREFIX: char = 'S';
const SUFFIX_BYTES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generates a fresh order number stamped with `now`.
    pub fn generate(now: &Timestamp) -> Self {
        let mut suffix = [0u8; SUFFIX_BYTES];
        rand::thread_rng().fill_bytes(&mut suffix);
        Self(format!("{}{}{}", PREFIX, now.compact(), hex::encode(suffix)))
    }

    /// Wraps an existing order number, e.g. a gateway's `trade_order_id`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("order_no"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
