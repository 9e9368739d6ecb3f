//! Settlement evidence and payment provider selection.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Largest accepted gap between a callback's fee and the stored amount (0.01).
pub const AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Payment providers an order can be settled through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    /// Offline or administrative settlement; no gateway involved.
    Manual,

    /// XunhuPay hosted checkout.
    XunhuPay,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Manual => "manual",
            PaymentProvider::XunhuPay => "xunhupay",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProvider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(PaymentProvider::Manual),
            "xunhupay" => Ok(PaymentProvider::XunhuPay),
            other => Err(ValidationError::invalid_format(
                "payment_provider",
                format!("unsupported provider '{}'", other),
            )),
        }
    }
}

/// Evidence carried from a callback or manual confirmation into activation.
///
/// Empty fields never overwrite what the order already records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentResult {
    pub provider: String,
    pub transaction_id: String,
    pub open_order_id: String,
    pub plugin: String,
}

impl PaymentResult {
    /// Evidence naming only the provider.
    pub fn for_provider(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    pub fn manual() -> Self {
        Self::for_provider(PaymentProvider::Manual.as_str())
    }
}

/// True when `actual` is strictly within 0.01 of `expected`.
pub fn amount_matches(expected: Decimal, actual: Decimal) -> bool {
    (expected - actual).abs() < AMOUNT_TOLERANCE
}
