//! HTTP adapter for order endpoints.
//!
//! Exposes the order lifecycle via REST API:
//! - `GET /plans` - Purchasable plans
//! - `POST /orders` - Purchase a plan
//! - `GET /orders` - Caller's orders
//! - `GET /orders/:id` - One of the caller's orders
//! - `GET /admin/orders` - All orders with filters
//! - `POST /admin/orders/:id/mark-paid` - Settle by hand
//! - `POST /admin/orders/:id/cancel` - Cancel a pending order
//! - `POST /payment/xunhupay/notify` - Gateway payment callback

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AuthenticatedUser, OrderApiError, OrderAppState};
pub use routes::{admin_routes, order_routes, orders_router, payment_routes};
