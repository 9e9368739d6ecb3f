//! Order repository port.
//!
//! Lookups by id or order number fail with `ErrorCode::OrderNotFound`
//! rather than returning `None`, so callers can map a missing row to a
//! distinct not-found error.

use async_trait::async_trait;

use super::TransactionContext;
use crate::domain::foundation::{DomainError, OrderId, PlanId, SubscriptionId, Timestamp, UserId};
use crate::domain::order::{Order, OrderNumber, OrderStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Listing filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilters {
    /// Substring of the order number.
    pub order_no: Option<String>,
    pub status: Option<OrderStatus>,
    pub user_id: Option<UserId>,
    pub plan_id: Option<PlanId>,
}

impl OrderFilters {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        let order_no_matches = self
            .order_no
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map_or(true, |needle| order.order_no.as_str().contains(needle));

        order_no_matches
            && self.status.map_or(true, |status| order.status == status)
            && self.user_id.as_ref().map_or(true, |user| &order.user_id == user)
            && self.plan_id.map_or(true, |plan| order.plan_id == plan)
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    /// Clamps page to at least 1 and page size into `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> Self {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size.min(MAX_PAGE_SIZE)
        };
        Self {
            page: page.max(1),
            page_size,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// A page of orders, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
    pub items: Vec<Order>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl OrderPage {
    pub fn pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        let size = u64::from(self.page_size);
        (self.total + size - 1) / size
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a new order.
    ///
    /// # Errors
    ///
    /// - `DuplicateOrderNumber` if the order number is taken
    /// - `DatabaseError` on persistence failure
    async fn create(&self, order: &Order) -> Result<(), DomainError>;

    async fn get_by_id(&self, id: &OrderId) -> Result<Order, DomainError>;

    async fn get_by_order_number(&self, order_no: &OrderNumber) -> Result<Order, DomainError>;

    async fn list(&self, filters: &OrderFilters, page: Pagination) -> Result<OrderPage, DomainError>;

    /// Replaces every mutable field of an existing order.
    async fn update(&self, order: &Order) -> Result<(), DomainError>;

    /// Changes status and stamps the matching timestamp.
    ///
    /// Fails with `InvalidStateTransition` if the stored status cannot
    /// move to `status`.
    async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        paid_at: Option<Timestamp>,
        canceled_at: Option<Timestamp>,
    ) -> Result<(), DomainError>;

    /// Cancels, in one statement, every pending order created before `cutoff`.
    ///
    /// Returns the number of orders canceled.
    async fn cancel_expired_pending(
        &self,
        cutoff: Timestamp,
        canceled_at: Timestamp,
    ) -> Result<u64, DomainError>;

    async fn set_subscription_id(
        &self,
        id: &OrderId,
        subscription_id: SubscriptionId,
    ) -> Result<(), DomainError>;

    /// Reads an order inside `tx`, locking it until the transaction ends.
    async fn get_for_update(
        &self,
        tx: &mut dyn TransactionContext,
        id: &OrderId,
    ) -> Result<Order, DomainError>;

    /// Writes an order inside `tx`.
    async fn update_in(
        &self,
        tx: &mut dyn TransactionContext,
        order: &Order,
    ) -> Result<(), DomainError>;
}
