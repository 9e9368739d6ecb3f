//! Purchasable plan view.
//!
//! Plans (subscription groups) live in an external catalog. Orders only
//! need the handful of fields that decide whether a plan can be bought
//! and what it costs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderError;
use crate::domain::foundation::PlanId;

/// Validity used when a plan declares a non-positive duration.
pub const DEFAULT_VALIDITY_DAYS: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Inactive,
}

/// Billing model of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Time-boxed subscription; the only kind that can be purchased.
    Subscription,

    /// Pay-as-you-go balance plan.
    Standard,
}

/// Catalog entry for a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub status: PlanStatus,
    pub plan_type: PlanType,
    pub purchase_enabled: bool,
    pub purchase_price: Option<Decimal>,
    pub default_validity_days: i32,
}

impl Plan {
    /// Returns true when every purchase precondition holds.
    pub fn is_purchasable(&self) -> bool {
        self.ensure_purchasable().is_ok()
    }

    /// Checks purchase preconditions and returns the price to charge.
    pub fn ensure_purchasable(&self) -> Result<Decimal, OrderError> {
        let reject = |reason: &str| OrderError::InvalidPlan {
            plan_id: self.id,
            reason: reason.to_string(),
        };

        if self.status != PlanStatus::Active {
            return Err(reject("plan is not active"));
        }
        if self.plan_type != PlanType::Subscription {
            return Err(reject("plan is not a subscription plan"));
        }
        if !self.purchase_enabled {
            return Err(reject("purchasing is disabled"));
        }
        match self.purchase_price {
            Some(price) if price < Decimal::ZERO => Err(reject("purchase price is negative")),
            Some(price) => Ok(price),
            None => Err(reject("plan has no purchase price")),
        }
    }
}

/// Defaults non-positive durations and clamps to `max_days`.
pub fn normalize_validity_days(days: i32, max_days: i32) -> i32 {
    let days = if days <= 0 { DEFAULT_VALIDITY_DAYS } else { days };
    days.min(max_days.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn plan() -> Plan {
        Plan {
            id: PlanId::new(1).unwrap(),
            name: "Pro".to_string(),
            status: PlanStatus::Active,
            plan_type: PlanType::Subscription,
            purchase_enabled: true,
            purchase_price: Some(dec!(19.90)),
            default_validity_days: 30,
        }
    }

    #[test]
    fn purchasable_plan_returns_price() {
        assert_eq!(plan().ensure_purchasable().unwrap(), dec!(19.90));
    }

    #[test]
    fn zero_price_is_purchasable() {
        let free = Plan {
            purchase_price: Some(Decimal::ZERO),
            ..plan()
        };
        assert_eq!(free.ensure_purchasable().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn each_precondition_rejects_with_invalid_plan() {
        let cases = [
            Plan { status: PlanStatus::Inactive, ..plan() },
            Plan { plan_type: PlanType::Standard, ..plan() },
            Plan { purchase_enabled: false, ..plan() },
            Plan { purchase_price: None, ..plan() },
            Plan { purchase_price: Some(dec!(-1)), ..plan() },
        ];
        for case in cases {
            assert!(
                matches!(case.ensure_purchasable(), Err(OrderError::InvalidPlan { .. })),
                "{:?}",
                case
            );
            assert!(!case.is_purchasable());
        }
    }

    #[test]
    fn non_positive_validity_defaults_to_thirty() {
        assert_eq!(normalize_validity_days(0, 36500), 30);
        assert_eq!(normalize_validity_days(-5, 36500), 30);
    }

    #[test]
    fn validity_is_clamped_to_max() {
        assert_eq!(normalize_validity_days(90, 36500), 90);
        assert_eq!(normalize_validity_days(50000, 36500), 36500);
        assert_eq!(normalize_validity_days(0, 7), 7);
    }
}
