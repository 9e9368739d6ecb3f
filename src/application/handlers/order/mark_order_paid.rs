//! MarkOrderPaidHandler - Administrative settlement of a pending order.
//!
//! Goes through the same activation as gateway callbacks, with the
//! order's own provider as the only settlement evidence.

use std::sync::Arc;

use super::OrderActivator;
use crate::domain::foundation::OrderId;
use crate::domain::order::{Order, OrderError, PaymentProvider, PaymentResult};
use crate::ports::OrderRepository;

#[derive(Debug, Clone)]
pub struct MarkOrderPaidCommand {
    pub order_id: OrderId,
}

#[derive(Debug, Clone)]
pub struct MarkOrderPaidResult {
    pub order: Order,
}

pub struct MarkOrderPaidHandler {
    orders: Arc<dyn OrderRepository>,
    activator: Arc<OrderActivator>,
}

impl MarkOrderPaidHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, activator: Arc<OrderActivator>) -> Self {
        Self { orders, activator }
    }

    pub async fn handle(&self, cmd: MarkOrderPaidCommand) -> Result<MarkOrderPaidResult, OrderError> {
        let order = self.orders.get_by_id(&cmd.order_id).await?;

        let provider = match order.payment_provider.trim() {
            "" => PaymentProvider::Manual.as_str(),
            recorded => recorded,
        };
        let evidence = PaymentResult::for_provider(provider);

        let order = self.activator.activate(&order, evidence).await?;
        Ok(MarkOrderPaidResult { order })
    }
}
