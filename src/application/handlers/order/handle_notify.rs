//! HandleNotifyHandler - Processes XunhuPay payment callbacks.
//!
//! Safe to replay: a callback for an order that is already paid is
//! acknowledged without touching anything. Forged or tampered callbacks
//! are rejected before any lookup, and a late callback cannot revive a
//! canceled order.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::{ExpiredOrderSweeper, OrderActivator};
use crate::domain::order::{amount_matches, Order, OrderError, OrderNumber, OrderStatus};
use crate::domain::payment::NotifyPayload;
use crate::ports::{OrderRepository, PaymentGateway, PaymentSettingsSource};

/// A callback as posted by the gateway.
#[derive(Debug, Clone)]
pub struct HandleNotifyCommand {
    pub payload: NotifyPayload,
}

/// What the callback did. Every variant is acknowledged as success.
#[derive(Debug, Clone)]
pub enum HandleNotifyResult {
    /// The order was settled by this callback.
    Activated(Order),

    /// A previous delivery already settled the order.
    AlreadyPaid(Order),

    /// Informational status; nothing changed.
    Ignored { status: String },
}

pub struct HandleNotifyHandler {
    orders: Arc<dyn OrderRepository>,
    settings: Arc<dyn PaymentSettingsSource>,
    gateway: Arc<dyn PaymentGateway>,
    activator: Arc<OrderActivator>,
    sweeper: Arc<ExpiredOrderSweeper>,
}

impl HandleNotifyHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        settings: Arc<dyn PaymentSettingsSource>,
        gateway: Arc<dyn PaymentGateway>,
        activator: Arc<OrderActivator>,
        sweeper: Arc<ExpiredOrderSweeper>,
    ) -> Self {
        Self {
            orders,
            settings,
            gateway,
            activator,
            sweeper,
        }
    }

    pub async fn handle(&self, cmd: HandleNotifyCommand) -> Result<HandleNotifyResult, OrderError> {
        let payload = cmd.payload;

        // 1. Reclaim stale orders first
        self.sweeper.sweep_best_effort().await;

        // 2. Gateway must be configured
        let settings = self.settings.payment_settings().await?;
        let (app_id, secret) = settings.notify_credentials()?;

        // 3. Origin check
        if payload.appid.trim() != app_id {
            tracing::warn!(
                trade_order_id = %payload.trade_order_id,
                appid = %payload.appid,
                "notify rejected: appid mismatch"
            );
            return Err(OrderError::InvalidSignature);
        }

        // 4. Digest check
        if !self.gateway.verify_notify(&payload, secret) {
            tracing::warn!(
                trade_order_id = %payload.trade_order_id,
                "notify rejected: hash mismatch"
            );
            return Err(OrderError::InvalidSignature);
        }

        // 5. Only completed payments settle
        if !payload.is_paid() {
            tracing::debug!(
                trade_order_id = %payload.trade_order_id,
                status = %payload.status,
                "notify ignored: payment not completed"
            );
            return Ok(HandleNotifyResult::Ignored {
                status: payload.status,
            });
        }

        // 6. Replays are no-ops
        let order_no = OrderNumber::new(payload.trade_order_id.as_str())?;
        let order = self.orders.get_by_order_number(&order_no).await?;
        if order.status == OrderStatus::Paid {
            tracing::info!(order_no = %order.order_no, "notify replay for paid order");
            return Ok(HandleNotifyResult::AlreadyPaid(order));
        }

        // 7. Canceled orders stay canceled
        order.ensure_pending("settle")?;

        // 8. Amount guard
        check_amount(&order, &payload.total_fee)?;

        // 9. Settle
        let paid = self.activator.activate(&order, payload.payment_result()).await?;
        Ok(HandleNotifyResult::Activated(paid))
    }
}

/// Compares a declared fee with the stored amount. A blank fee is not checked.
fn check_amount(order: &Order, total_fee: &str) -> Result<(), OrderError> {
    let total_fee = total_fee.trim();
    if total_fee.is_empty() {
        return Ok(());
    }

    let mismatch = || {
        tracing::warn!(
            order_no = %order.order_no,
            expected = %order.amount,
            total_fee,
            "notify rejected: amount mismatch"
        );
        OrderError::AmountMismatch {
            expected: order.amount,
            actual: total_fee.to_string(),
        }
    };

    let paid = Decimal::from_str(total_fee).map_err(|_| mismatch())?;
    if amount_matches(order.amount, paid) {
        Ok(())
    } else {
        Err(mismatch())
    }
}
