//! GetOrderHandler - Query handler for a single order.

use std::sync::Arc;

use super::ExpiredOrderSweeper;
use crate::domain::foundation::{OrderId, UserId};
use crate::domain::order::{Order, OrderError};
use crate::ports::OrderRepository;

/// Query for one order.
///
/// With `owner` set, orders belonging to anyone else are reported as not
/// found rather than forbidden.
#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    pub order_id: OrderId,
    pub owner: Option<UserId>,
}

pub struct GetOrderHandler {
    orders: Arc<dyn OrderRepository>,
    sweeper: Arc<ExpiredOrderSweeper>,
}

impl GetOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, sweeper: Arc<ExpiredOrderSweeper>) -> Self {
        Self { orders, sweeper }
    }

    pub async fn handle(&self, query: GetOrderQuery) -> Result<Order, OrderError> {
        self.sweeper.sweep_best_effort().await;

        let order = self.orders.get_by_id(&query.order_id).await?;
        match &query.owner {
            Some(owner) if owner != &order.user_id => Err(OrderError::order_not_found(query.order_id)),
            _ => Ok(order),
        }
    }
}
