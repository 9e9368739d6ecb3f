//! Order aggregate entity.
//!
//! An Order represents one attempt by a user to buy a plan. It is created
//! `pending`, and leaves that state exactly once.
//!
//! # Invariants
//!
//! - `order_no` is immutable once created
//! - `paid` ⇔ `paid_at` set ⇔ `subscription_id` set
//! - `canceled` ⇔ `canceled_at` set; never both timestamps
//! - `amount >= 0`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderNumber, OrderStatus, PaymentResult};
use crate::domain::foundation::{OrderId, PlanId, StateMachine, SubscriptionId, Timestamp, UserId};

/// Fields supplied when opening a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub payment_provider: String,
    pub amount: Decimal,
    pub currency: String,
    pub validity_days: i32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_no: OrderNumber,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub subscription_id: Option<SubscriptionId>,

    /// Provider name recorded at creation, overlaid by settlement evidence.
    pub payment_provider: String,
    pub payment_url: Option<String>,
    pub payment_qr_code: Option<String>,
    pub transaction_id: Option<String>,
    pub open_order_id: Option<String>,
    pub payment_plugin: Option<String>,

    pub status: OrderStatus,
    pub amount: Decimal,
    pub currency: String,
    pub validity_days: i32,
    pub paid_at: Option<Timestamp>,
    pub canceled_at: Option<Timestamp>,
    pub notes: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Opens a pending order.
    pub fn create(new: NewOrder, order_no: OrderNumber, now: Timestamp) -> Result<Self, OrderError> {
        if new.amount < Decimal::ZERO {
            return Err(OrderError::InvalidInput(format!(
                "order amount must not be negative, got {}",
                new.amount
            )));
        }
        if new.validity_days <= 0 {
            return Err(OrderError::InvalidInput(format!(
                "validity days must be positive, got {}",
                new.validity_days
            )));
        }

        Ok(Self {
            id: OrderId::new(),
            order_no,
            user_id: new.user_id,
            plan_id: new.plan_id,
            subscription_id: None,
            payment_provider: new.payment_provider,
            payment_url: None,
            payment_qr_code: None,
            transaction_id: None,
            open_order_id: None,
            payment_plugin: None,
            status: OrderStatus::Pending,
            amount: new.amount,
            currency: new.currency,
            validity_days: new.validity_days,
            paid_at: None,
            canceled_at: None,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    /// Fails with `InvalidStatus` unless the order is still pending.
    pub fn ensure_pending(&self, attempted: &'static str) -> Result<(), OrderError> {
        if self.is_pending() {
            Ok(())
        } else {
            Err(OrderError::InvalidStatus {
                current: self.status,
                attempted,
            })
        }
    }

    /// Settles the order against a granted subscription.
    ///
    /// Non-empty evidence fields are overlaid onto the order.
    pub fn mark_paid(
        &mut self,
        subscription_id: SubscriptionId,
        evidence: &PaymentResult,
        at: Timestamp,
    ) -> Result<(), OrderError> {
        self.transition(OrderStatus::Paid, "mark paid")?;
        self.paid_at = Some(at);
        self.subscription_id = Some(subscription_id);

        if !evidence.provider.is_empty() {
            self.payment_provider = evidence.provider.clone();
        }
        overlay(&mut self.transaction_id, &evidence.transaction_id);
        overlay(&mut self.open_order_id, &evidence.open_order_id);
        overlay(&mut self.payment_plugin, &evidence.plugin);

        self.updated_at = at;
        Ok(())
    }

    pub fn cancel(&mut self, at: Timestamp) -> Result<(), OrderError> {
        self.transition(OrderStatus::Canceled, "cancel")?;
        self.canceled_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// Records where the buyer can pay. Empty values are stored as absent.
    pub fn attach_payment_link(
        &mut self,
        url: &str,
        qr_code: &str,
        plugin: &str,
        at: Timestamp,
    ) -> Result<(), OrderError> {
        self.ensure_pending("attach payment link")?;
        self.payment_url = non_empty(url);
        self.payment_qr_code = non_empty(qr_code);
        overlay(&mut self.payment_plugin, plugin);
        self.updated_at = at;
        Ok(())
    }

    /// Checks the status/timestamp/subscription invariants.
    pub fn is_consistent(&self) -> bool {
        let paid = self.status == OrderStatus::Paid;
        let canceled = self.status == OrderStatus::Canceled;
        paid == self.paid_at.is_some()
            && paid == self.subscription_id.is_some()
            && canceled == self.canceled_at.is_some()
            && !(self.paid_at.is_some() && self.canceled_at.is_some())
            && self.amount >= Decimal::ZERO
    }

    fn transition(&mut self, target: OrderStatus, attempted: &'static str) -> Result<(), OrderError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| OrderError::InvalidStatus {
                current: self.status,
                attempted,
            })?;
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn overlay(slot: &mut Option<String>, value: &str) {
    if let Some(value) = non_empty(value) {
        *slot = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_order(amount: Decimal) -> NewOrder {
        NewOrder {
            user_id: UserId::new("user-1").unwrap(),
            plan_id: PlanId::new(3).unwrap(),
            payment_provider: "xunhupay".to_string(),
            amount,
            currency: "CNY".to_string(),
            validity_days: 30,
            notes: String::new(),
        }
    }

    fn pending(amount: Decimal) -> Order {
        let now = Timestamp::now();
        Order::create(new_order(amount), OrderNumber::generate(&now), now).unwrap()
    }

    // ══════════════════════════════════════════════════════════════
    // Creation
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn create_opens_pending_order() {
        let order = pending(dec!(9.90));
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.paid_at.is_none());
        assert!(order.canceled_at.is_none());
        assert!(order.subscription_id.is_none());
        assert!(order.is_consistent());
    }

    #[test]
    fn create_rejects_negative_amount() {
        let now = Timestamp::now();
        let result = Order::create(new_order(dec!(-0.01)), OrderNumber::generate(&now), now);
        assert!(matches!(result, Err(OrderError::InvalidInput(_))));
    }

    #[test]
    fn create_rejects_non_positive_validity() {
        let now = Timestamp::now();
        let mut input = new_order(dec!(1));
        input.validity_days = 0;
        assert!(Order::create(input, OrderNumber::generate(&now), now).is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // Settlement
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn mark_paid_sets_timestamp_subscription_and_evidence() {
        let mut order = pending(dec!(9.90));
        let evidence = PaymentResult {
            provider: "xunhupay".to_string(),
            transaction_id: "tx-1".to_string(),
            open_order_id: "open-1".to_string(),
            plugin: String::new(),
        };
        let sub = SubscriptionId::new();

        order.mark_paid(sub, &evidence, Timestamp::now()).unwrap();

        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.subscription_id, Some(sub));
        assert_eq!(order.transaction_id.as_deref(), Some("tx-1"));
        assert_eq!(order.open_order_id.as_deref(), Some("open-1"));
        assert!(order.payment_plugin.is_none());
        assert!(order.is_consistent());
    }

    #[test]
    fn empty_evidence_keeps_recorded_values() {
        let mut order = pending(dec!(9.90));
        order.payment_plugin = Some("wechat".to_string());

        order
            .mark_paid(SubscriptionId::new(), &PaymentResult::default(), Timestamp::now())
            .unwrap();

        assert_eq!(order.payment_provider, "xunhupay");
        assert_eq!(order.payment_plugin.as_deref(), Some("wechat"));
    }

    #[test]
    fn paid_order_cannot_be_paid_again_or_canceled() {
        let mut order = pending(dec!(9.90));
        order
            .mark_paid(SubscriptionId::new(), &PaymentResult::manual(), Timestamp::now())
            .unwrap();
        let snapshot = order.clone();

        let again = order.mark_paid(SubscriptionId::new(), &PaymentResult::manual(), Timestamp::now());
        assert!(matches!(
            again,
            Err(OrderError::InvalidStatus { current: OrderStatus::Paid, .. })
        ));
        assert!(order.cancel(Timestamp::now()).is_err());
        assert_eq!(order, snapshot);
    }

    #[test]
    fn cancel_sets_canceled_at_only() {
        let mut order = pending(dec!(9.90));
        order.cancel(Timestamp::now()).unwrap();

        assert_eq!(order.status, OrderStatus::Canceled);
        assert!(order.canceled_at.is_some());
        assert!(order.paid_at.is_none());
        assert!(order.is_consistent());
    }

    #[test]
    fn canceled_order_cannot_be_paid() {
        let mut order = pending(dec!(9.90));
        order.cancel(Timestamp::now()).unwrap();
        let result = order.mark_paid(SubscriptionId::new(), &PaymentResult::manual(), Timestamp::now());
        assert!(matches!(result, Err(OrderError::InvalidStatus { .. })));
        assert!(order.subscription_id.is_none());
    }

    #[test]
    fn attach_payment_link_stores_non_empty_values() {
        let mut order = pending(dec!(9.90));
        order
            .attach_payment_link("https://pay/1", "", "wechat", Timestamp::now())
            .unwrap();
        assert_eq!(order.payment_url.as_deref(), Some("https://pay/1"));
        assert!(order.payment_qr_code.is_none());
        assert_eq!(order.payment_plugin.as_deref(), Some("wechat"));
    }
}
