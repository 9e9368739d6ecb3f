//! CreateOrderHandler - Command handler for purchasing a plan.
//!
//! Free plans are settled on the spot. Paid plans either wait for offline
//! settlement (manual provider) or get a hosted checkout link from the
//! gateway. When the gateway call or the follow-up write fails, the new
//! order is canceled on a best-effort basis and the original error is
//! returned.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::OrderActivator;
use crate::domain::foundation::{ErrorCode, PlanId, Timestamp, UserId};
use crate::domain::order::{
    normalize_validity_days, NewOrder, Order, OrderError, OrderNumber, OrderStatus, PaymentProvider,
    PaymentResult, Plan,
};
use crate::domain::payment::{GatewayConfig, ResolvedProvider};
use crate::ports::{OrderRepository, PaymentGateway, PaymentSettingsSource, PlanReader};

/// Attempts at finding an unused order number.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Command to purchase a plan.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub notes: String,
}

/// Result of a purchase.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order: Order,
    pub provider: PaymentProvider,
}

#[derive(Debug, Clone)]
pub struct CreateOrderConfig {
    /// Upper bound for a plan's validity days.
    pub max_validity_days: i32,
    pub currency: String,
}

impl Default for CreateOrderConfig {
    fn default() -> Self {
        Self {
            max_validity_days: 36500,
            currency: "CNY".to_string(),
        }
    }
}

pub struct CreateOrderHandler {
    plans: Arc<dyn PlanReader>,
    orders: Arc<dyn OrderRepository>,
    settings: Arc<dyn PaymentSettingsSource>,
    gateway: Arc<dyn PaymentGateway>,
    activator: Arc<OrderActivator>,
    config: CreateOrderConfig,
}

impl CreateOrderHandler {
    pub fn new(
        plans: Arc<dyn PlanReader>,
        orders: Arc<dyn OrderRepository>,
        settings: Arc<dyn PaymentSettingsSource>,
        gateway: Arc<dyn PaymentGateway>,
        activator: Arc<OrderActivator>,
        config: CreateOrderConfig,
    ) -> Self {
        Self {
            plans,
            orders,
            settings,
            gateway,
            activator,
            config,
        }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, OrderError> {
        // 1. Plan must be purchasable
        let plan = self.plans.get_plan(cmd.plan_id).await?;
        let amount = plan.ensure_purchasable()?;

        // 2. Normalize validity
        let validity_days =
            normalize_validity_days(plan.default_validity_days, self.config.max_validity_days);

        // 3. Resolve provider from the final amount
        let resolved = self.resolve_provider(amount).await?;
        let provider = resolved.provider();

        // 4. Persist pending order
        let order = self
            .persist(NewOrder {
                user_id: cmd.user_id,
                plan_id: plan.id,
                payment_provider: provider.as_str().to_string(),
                amount,
                currency: self.config.currency.clone(),
                validity_days,
                notes: cmd.notes,
            })
            .await?;

        tracing::info!(
            order_no = %order.order_no,
            user_id = %order.user_id,
            plan_id = %order.plan_id,
            amount = %order.amount,
            provider = %provider,
            "order created"
        );

        let outcome = if amount.is_zero() {
            // 5. Free orders settle immediately
            self.activator.activate(&order, PaymentResult::manual()).await
        } else {
            match resolved {
                // 6. Offline settlement
                ResolvedProvider::Manual => Ok(order.clone()),
                // 7. Hosted checkout
                ResolvedProvider::XunhuPay(config) => {
                    self.checkout(&config, &plan, order.clone()).await
                }
            }
        };

        match outcome {
            Ok(order) => Ok(CreateOrderResult { order, provider }),
            Err(err) => {
                self.cancel_best_effort(&order).await;
                Err(err)
            }
        }
    }

    async fn resolve_provider(&self, amount: Decimal) -> Result<ResolvedProvider, OrderError> {
        if amount <= Decimal::ZERO {
            return Ok(ResolvedProvider::Manual);
        }
        let settings = self.settings.payment_settings().await?;
        settings.resolve()
    }

    async fn persist(&self, new: NewOrder) -> Result<Order, OrderError> {
        let mut attempt = 1;
        loop {
            let now = Timestamp::now();
            let order = Order::create(new.clone(), OrderNumber::generate(&now), now)?;
            match self.orders.create(&order).await {
                Ok(()) => return Ok(order),
                Err(e) if e.code == ErrorCode::DuplicateOrderNumber && attempt < ORDER_NUMBER_ATTEMPTS => {
                    tracing::warn!(order_no = %order.order_no, attempt, "order number collision, regenerating");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn checkout(
        &self,
        config: &GatewayConfig,
        plan: &Plan,
        mut order: Order,
    ) -> Result<Order, OrderError> {
        let title = format!("{} {} days", plan.name, order.validity_days);
        let link = self.gateway.create_payment(config, &order, &title).await?;

        order.attach_payment_link(
            &link.url,
            &link.qr_code,
            config.plugins.as_deref().unwrap_or_default(),
            Timestamp::now(),
        )?;
        self.orders.update(&order).await?;
        Ok(order)
    }

    async fn cancel_best_effort(&self, order: &Order) {
        let result = self
            .orders
            .update_status(&order.id, OrderStatus::Canceled, None, Some(Timestamp::now()))
            .await;
        match result {
            Ok(()) => tracing::info!(order_no = %order.order_no, "canceled order after failed creation"),
            Err(e) => tracing::warn!(
                order_no = %order.order_no,
                error = %e,
                "could not cancel order after failed creation"
            ),
        }
    }
}
