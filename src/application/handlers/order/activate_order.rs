//! OrderActivator - Transactional settlement of a pending order.
//!
//! Shared by every path that makes an order paid: free orders at creation,
//! gateway callbacks and manual confirmation.
//!
//! Inside one unit of work the activator re-reads the order under lock,
//! grants or extends the subscription, and writes the paid order. Any
//! failure rolls the whole unit back, so an order is never paid without a
//! subscription and a subscription is never granted for an unpaid order.

use std::sync::Arc;

use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::order::{Order, OrderError, PaymentResult};
use crate::ports::{
    AssignSubscription, OrderRepository, SubscriptionAssigner, TransactionContext, UnitOfWork,
};

pub struct OrderActivator {
    orders: Arc<dyn OrderRepository>,
    subscriptions: Arc<dyn SubscriptionAssigner>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl OrderActivator {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        subscriptions: Arc<dyn SubscriptionAssigner>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            orders,
            subscriptions,
            unit_of_work,
        }
    }

    /// Marks `order` paid and grants its subscription, atomically.
    ///
    /// The pending check on `order` is only a fast path; the authoritative
    /// check runs against the locked row inside the transaction.
    pub async fn activate(&self, order: &Order, evidence: PaymentResult) -> Result<Order, OrderError> {
        order.ensure_pending("activate")?;

        let mut tx = self.unit_of_work.begin().await?;
        if let Err(err) = self.settle(tx.as_mut(), order.id, &evidence).await {
            if let Err(rollback_err) = self.unit_of_work.rollback(tx).await {
                tracing::warn!(
                    order_no = %order.order_no,
                    error = %rollback_err,
                    "rollback after failed activation failed"
                );
            }
            return Err(err);
        }
        self.unit_of_work.commit(tx).await?;

        let paid = self.orders.get_by_id(&order.id).await?;
        tracing::info!(
            order_no = %paid.order_no,
            user_id = %paid.user_id,
            provider = %paid.payment_provider,
            subscription_id = ?paid.subscription_id,
            "order activated"
        );
        Ok(paid)
    }

    async fn settle(
        &self,
        tx: &mut dyn TransactionContext,
        id: OrderId,
        evidence: &PaymentResult,
    ) -> Result<(), OrderError> {
        let mut current = self.orders.get_for_update(&mut *tx, &id).await?;
        current.ensure_pending("activate")?;

        let subscription_id = self
            .subscriptions
            .assign_or_extend(
                &mut *tx,
                AssignSubscription {
                    user_id: current.user_id.clone(),
                    plan_id: current.plan_id,
                    validity_days: current.validity_days,
                    assigned_by: None,
                    notes: format!("order {}", current.order_no),
                },
            )
            .await?;

        current.mark_paid(subscription_id, evidence, Timestamp::now())?;
        self.orders.update_in(tx, &current).await?;
        Ok(())
    }
}
