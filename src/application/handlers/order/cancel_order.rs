//! CancelOrderHandler - Cancels a pending order.
//!
//! Runs as a unit of work so the status check and the write see the same
//! row that a concurrent activation would lock.

use std::sync::Arc;

use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::order::{Order, OrderError};
use crate::ports::{OrderRepository, TransactionContext, UnitOfWork};

#[derive(Debug, Clone)]
pub struct CancelOrderCommand {
    pub order_id: OrderId,
}

#[derive(Debug, Clone)]
pub struct CancelOrderResult {
    pub order: Order,
}

pub struct CancelOrderHandler {
    orders: Arc<dyn OrderRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl CancelOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            orders,
            unit_of_work,
        }
    }

    pub async fn handle(&self, cmd: CancelOrderCommand) -> Result<CancelOrderResult, OrderError> {
        let mut tx = self.unit_of_work.begin().await?;
        let order = match self.cancel_in(tx.as_mut(), &cmd.order_id).await {
            Ok(order) => order,
            Err(err) => {
                if let Err(rollback_err) = self.unit_of_work.rollback(tx).await {
                    tracing::warn!(order_id = %cmd.order_id, error = %rollback_err, "rollback failed");
                }
                return Err(err);
            }
        };
        self.unit_of_work.commit(tx).await?;

        tracing::info!(order_no = %order.order_no, "order canceled");
        Ok(CancelOrderResult { order })
    }

    async fn cancel_in(
        &self,
        tx: &mut dyn TransactionContext,
        id: &OrderId,
    ) -> Result<Order, OrderError> {
        let mut order = self.orders.get_for_update(&mut *tx, id).await?;
        order.cancel(Timestamp::now())?;
        self.orders.update_in(tx, &order).await?;
        Ok(order)
    }
}
