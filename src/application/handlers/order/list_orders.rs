//! Order listing queries.
//!
//! - `ListOrdersHandler` - Admin listing across all users with filters
//! - `ListUserOrdersHandler` - A single user's own orders
//!
//! Both sweep expired orders first so listings never show stale pending
//! orders as payable.

use std::sync::Arc;

use super::ExpiredOrderSweeper;
use crate::domain::foundation::UserId;
use crate::domain::order::OrderError;
use crate::ports::{OrderFilters, OrderPage, OrderRepository, Pagination};

#[derive(Debug, Clone, Default)]
pub struct ListOrdersQuery {
    pub filters: OrderFilters,
    pub page: Pagination,
}

pub struct ListOrdersHandler {
    orders: Arc<dyn OrderRepository>,
    sweeper: Arc<ExpiredOrderSweeper>,
}

impl ListOrdersHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, sweeper: Arc<ExpiredOrderSweeper>) -> Self {
        Self { orders, sweeper }
    }

    pub async fn handle(&self, query: ListOrdersQuery) -> Result<OrderPage, OrderError> {
        self.sweeper.sweep_best_effort().await;
        Ok(self.orders.list(&query.filters, query.page).await?)
    }
}

#[derive(Debug, Clone)]
pub struct ListUserOrdersQuery {
    pub user_id: UserId,
    pub page: Pagination,
}

pub struct ListUserOrdersHandler {
    orders: Arc<dyn OrderRepository>,
    sweeper: Arc<ExpiredOrderSweeper>,
}

impl ListUserOrdersHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, sweeper: Arc<ExpiredOrderSweeper>) -> Self {
        Self { orders, sweeper }
    }

    pub async fn handle(&self, query: ListUserOrdersQuery) -> Result<OrderPage, OrderError> {
        self.sweeper.sweep_best_effort().await;
        let filters = OrderFilters::for_user(query.user_id);
        Ok(self.orders.list(&filters, query.page).await?)
    }
}
