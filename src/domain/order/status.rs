//! Order status state machine.
//!
//! `pending` is the only non-terminal state. An order leaves it exactly
//! once, either to `paid` or to `canceled`.

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};

/// Purchase order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created and awaiting settlement.
    Pending,

    /// Settled; the subscription has been granted or extended.
    Paid,

    /// Abandoned, expired, or failed at the gateway.
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "canceled" | "cancelled" => Ok(OrderStatus::Canceled),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown order status '{}'", other),
            )),
        }
    }
}

impl StateMachine for OrderStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            OrderStatus::Pending => vec![OrderStatus::Paid, OrderStatus::Canceled],
            OrderStatus::Paid | OrderStatus::Canceled => vec![],
        }
    }
}
