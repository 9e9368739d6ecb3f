//! In-memory order store.
//!
//! Non-transactional calls lock the committed tables for one operation.
//! Transactional calls read and write the working copy held by the
//! transaction, which already owns the database lock.

use async_trait::async_trait;

use super::database::{InMemoryDatabase, Tables};
use crate::domain::foundation::{
    DomainError, ErrorCode, OrderId, StateMachine, SubscriptionId, Timestamp,
};
use crate::domain::order::{Order, OrderNumber, OrderStatus};
use crate::ports::{OrderFilters, OrderPage, OrderRepository, Pagination, TransactionContext};

#[derive(Clone)]
pub struct InMemoryOrderStore {
    database: InMemoryDatabase,
}

impl InMemoryOrderStore {
    pub fn new(database: InMemoryDatabase) -> Self {
        Self { database }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<(), DomainError> {
        let mut tables = self.database.lock().await;
        if tables.orders.values().any(|o| o.order_no == order.order_no) {
            return Err(DomainError::new(
                ErrorCode::DuplicateOrderNumber,
                format!("order number {} already exists", order.order_no),
            )
            .with_detail("order_no", order.order_no.as_str()));
        }
        if tables.orders.contains_key(&order.id) {
            return Err(DomainError::database(format!("order {} already exists", order.id)));
        }
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &OrderId) -> Result<Order, DomainError> {
        let tables = self.database.lock().await;
        find(&tables, id).cloned()
    }

    async fn get_by_order_number(&self, order_no: &OrderNumber) -> Result<Order, DomainError> {
        let tables = self.database.lock().await;
        tables
            .orders
            .values()
            .find(|o| &o.order_no == order_no)
            .cloned()
            .ok_or_else(|| not_found(order_no.as_str()))
    }

    async fn list(&self, filters: &OrderFilters, page: Pagination) -> Result<OrderPage, DomainError> {
        let tables = self.database.lock().await;
        let mut matching: Vec<&Order> = tables.orders.values().filter(|o| filters.matches(o)).collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_no.as_str().cmp(a.order_no.as_str()))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .cloned()
            .collect();

        Ok(OrderPage {
            items,
            total,
            page: page.page,
            page_size: page.page_size,
        })
    }

    async fn update(&self, order: &Order) -> Result<(), DomainError> {
        let mut tables = self.database.lock().await;
        write(&mut tables, order)
    }

    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        _paid_at: Option<Timestamp>,
        canceled_at: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        if status == OrderStatus::Paid {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "orders become paid only through activation",
            ));
        }

        let mut tables = self.database.lock().await;
        let order = tables.orders.get_mut(id).ok_or_else(|| not_found(id))?;
        if !order.status.can_transition_to(&status) {
            return Err(invalid_transition(order.status, status));
        }

        let now = Timestamp::now();
        order.status = status;
        if status == OrderStatus::Canceled {
            order.canceled_at = Some(canceled_at.unwrap_or(now));
        }
        order.updated_at = now;
        Ok(())
    }

    async fn cancel_expired_pending(
        &self,
        cutoff: Timestamp,
        canceled_at: Timestamp,
    ) -> Result<u64, DomainError> {
        let mut tables = self.database.lock().await;
        let mut canceled = 0;
        for order in tables
            .orders
            .values_mut()
            .filter(|o| o.is_pending() && o.created_at.is_before(&cutoff))
        {
            order.status = OrderStatus::Canceled;
            order.canceled_at = Some(canceled_at);
            order.updated_at = canceled_at;
            canceled += 1;
        }
        Ok(canceled)
    }

    async fn set_subscription_id(
        &self,
        id: &OrderId,
        subscription_id: SubscriptionId,
    ) -> Result<(), DomainError> {
        let mut tables = self.database.lock().await;
        let order = tables.orders.get_mut(id).ok_or_else(|| not_found(id))?;
        if order.status != OrderStatus::Paid {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("order {} is {}, only paid orders carry a subscription", id, order.status),
            ));
        }
        order.subscription_id = Some(subscription_id);
        order.updated_at = Timestamp::now();
        Ok(())
    }

    async fn get_for_update(
        &self,
        tx: &mut dyn TransactionContext,
        id: &OrderId,
    ) -> Result<Order, DomainError> {
        let tables = self.database.tables_in(tx)?;
        find(tables, id).cloned()
    }

    async fn update_in(
        &self,
        tx: &mut dyn TransactionContext,
        order: &Order,
    ) -> Result<(), DomainError> {
        let tables = self.database.tables_in(tx)?;
        write(tables, order)
    }
}

fn find<'a>(tables: &'a Tables, id: &OrderId) -> Result<&'a Order, DomainError> {
    tables.orders.get(id).ok_or_else(|| not_found(id))
}

/// Replaces a stored order, keeping its number and refusing to revive terminal orders.
fn write(tables: &mut Tables, order: &Order) -> Result<(), DomainError> {
    let stored = tables.orders.get_mut(&order.id).ok_or_else(|| not_found(order.id))?;
    if stored.order_no != order.order_no {
        return Err(DomainError::validation("order_no", "order number is immutable"));
    }
    if stored.status != order.status && !stored.status.can_transition_to(&order.status) {
        return Err(invalid_transition(stored.status, order.status));
    }
    *stored = order.clone();
    Ok(())
}

fn not_found(id: impl ToString) -> DomainError {
    let id = id.to_string();
    DomainError::new(ErrorCode::OrderNotFound, format!("order {} not found", id)).with_detail("id", id)
}

fn invalid_transition(from: OrderStatus, to: OrderStatus) -> DomainError {
    DomainError::new(
        ErrorCode::InvalidStateTransition,
        format!("order cannot move from {} to {}", from, to),
    )
}
