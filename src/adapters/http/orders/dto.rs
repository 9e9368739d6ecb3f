//! HTTP DTOs (Data Transfer Objects) for order endpoints.
//!
//! These types define the JSON request/response structure for the order API.
//! They serve as the boundary between HTTP and the application layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::handlers::order::CreateOrderResult;
use crate::domain::foundation::{PlanId, Timestamp, UserId};
use crate::domain::order::{Order, OrderError, OrderStatus, Plan};
use crate::ports::{OrderFilters, OrderPage, Pagination};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to purchase a plan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    /// Plan to buy.
    pub plan_id: i64,
    /// Free-form buyer notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Paging query string (`?page=2&page_size=20`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page.unwrap_or(1), self.page_size.unwrap_or(0))
    }
}

/// Admin listing query string.
///
/// `group_id` is accepted as an alias of `plan_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminOrderParams {
    #[serde(default)]
    pub order_no: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, alias = "group_id")]
    pub plan_id: Option<i64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl AdminOrderParams {
    /// Converts the query string into store filters. Blank values are ignored.
    pub fn filters(&self) -> Result<OrderFilters, OrderError> {
        let order_no = non_blank(&self.order_no).map(str::to_string);
        let status = non_blank(&self.status)
            .map(str::parse::<OrderStatus>)
            .transpose()?;
        let user_id = non_blank(&self.user_id).map(UserId::new).transpose()?;
        let plan_id = self.plan_id.map(PlanId::new).transpose()?;

        Ok(OrderFilters {
            order_no,
            status,
            user_id,
            plan_id,
        })
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page.unwrap_or(1), self.page_size.unwrap_or(0))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Order as rendered to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_no: String,
    pub user_id: String,
    pub plan_id: i64,
    pub status: OrderStatus,
    pub amount: Decimal,
    pub currency: String,
    pub validity_days: i32,
    pub payment_provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canceled_at: Option<Timestamp>,
    pub notes: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            order_no: order.order_no.to_string(),
            user_id: order.user_id.to_string(),
            plan_id: order.plan_id.value(),
            status: order.status,
            amount: order.amount,
            currency: order.currency,
            validity_days: order.validity_days,
            payment_provider: order.payment_provider,
            payment_url: order.payment_url,
            payment_qr_code: order.payment_qr_code,
            transaction_id: order.transaction_id,
            subscription_id: order.subscription_id.map(|id| id.to_string()),
            paid_at: order.paid_at,
            canceled_at: order.canceled_at,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Response to a purchase.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    /// Provider the order will be settled through.
    pub provider: String,
    /// True when the order was settled immediately (free plans).
    pub paid: bool,
    pub order: OrderResponse,
}

impl From<CreateOrderResult> for CreateOrderResponse {
    fn from(result: CreateOrderResult) -> Self {
        Self {
            provider: result.provider.to_string(),
            paid: result.order.status == OrderStatus::Paid,
            order: result.order.into(),
        }
    }
}

/// One page of orders.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPageResponse {
    pub items: Vec<OrderResponse>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub pages: u64,
}

impl From<OrderPage> for OrderPageResponse {
    fn from(page: OrderPage) -> Self {
        let pages = page.pages();
        Self {
            items: page.items.into_iter().map(OrderResponse::from).collect(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            pages,
        }
    }
}

/// Purchasable plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub validity_days: i32,
}

impl From<Plan> for PlanResponse {
    fn from(plan: Plan) -> Self {
        Self {
            id: plan.id.value(),
            name: plan.name,
            price: plan.purchase_price.unwrap_or_default(),
            validity_days: plan.default_validity_days,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
