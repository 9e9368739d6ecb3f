//! Payment callback payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::order::{PaymentProvider, PaymentResult};

/// Callback status meaning the buyer has paid.
pub const STATUS_PAID: &str = "OD";

/// Form fields posted by the gateway to the notify URL.
///
/// Every field is textual and may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyPayload {
    pub appid: String,
    pub trade_order_id: String,
    pub total_fee: String,
    pub transaction_id: String,
    pub open_order_id: String,
    pub order_title: String,
    pub status: String,
    pub plugins: String,
    pub attach: String,
    pub time: String,
    pub nonce_str: String,
    pub hash: String,
}

impl NotifyPayload {
    /// The declared fields that the digest covers.
    pub fn signed_params(&self) -> BTreeMap<String, String> {
        [
            ("appid", &self.appid),
            ("trade_order_id", &self.trade_order_id),
            ("total_fee", &self.total_fee),
            ("transaction_id", &self.transaction_id),
            ("open_order_id", &self.open_order_id),
            ("order_title", &self.order_title),
            ("status", &self.status),
            ("plugins", &self.plugins),
            ("attach", &self.attach),
            ("time", &self.time),
            ("nonce_str", &self.nonce_str),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
    }

    /// True when the callback reports a completed payment.
    pub fn is_paid(&self) -> bool {
        self.status == STATUS_PAID
    }

    /// Settlement evidence carried into activation.
    pub fn payment_result(&self) -> PaymentResult {
        PaymentResult {
            provider: PaymentProvider::XunhuPay.as_str().to_string(),
            transaction_id: self.transaction_id.clone(),
            open_order_id: self.open_order_id.clone(),
            plugin: self.plugins.clone(),
        }
    }
}
