//! Axum router configuration for order endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    admin_cancel, admin_list_orders, admin_mark_paid, create_order, get_my_order, list_my_orders,
    list_plans, xunhupay_notify, OrderAppState,
};

/// Caller-facing routes. Require the `X-User-Id` header except `/plans`.
///
/// - `GET /plans` - Purchasable plans
/// - `POST /orders` - Purchase a plan
/// - `GET /orders` - Caller's orders
/// - `GET /orders/:id` - One of the caller's orders
pub fn order_routes() -> Router<OrderAppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/orders", get(list_my_orders).post(create_order))
        .route("/orders/:id", get(get_my_order))
}

/// Operator routes, mounted under `/admin`.
///
/// - `GET /orders` - All orders with filters
/// - `POST /orders/:id/mark-paid` - Settle by hand
/// - `POST /orders/:id/cancel` - Cancel a pending order
pub fn admin_routes() -> Router<OrderAppState> {
    Router::new()
        .route("/orders", get(admin_list_orders))
        .route("/orders/:id/mark-paid", post(admin_mark_paid))
        .route("/orders/:id/cancel", post(admin_cancel))
}

/// Gateway callback routes. No caller identity; the payload is signed.
pub fn payment_routes() -> Router<OrderAppState> {
    Router::new().route("/xunhupay/notify", post(xunhupay_notify))
}

/// The complete order service router with state applied.
pub fn orders_router(state: OrderAppState) -> Router {
    Router::new()
        .merge(order_routes())
        .nest("/admin", admin_routes())
        .nest("/payment", payment_routes())
        .with_state(state)
}
