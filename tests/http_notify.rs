//! Integration tests for the order HTTP surface.
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`:
//! 1. Gateway callbacks answer `success`/`fail` as plain text
//! 2. Caller endpoints require `X-User-Id` and hide other users' orders
//! 3. Errors render `{ "code", "message" }` with the mapped status

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use subscription_orders::adapters::http::{orders_router, OrderAppState};
use subscription_orders::adapters::memory::{
    InMemoryDatabase, InMemoryOrderStore, InMemoryPaymentSettings, InMemoryPlanCatalog,
    InMemorySubscriptionStore,
};
use subscription_orders::adapters::xunhupay::MockPaymentGateway;
use subscription_orders::domain::foundation::{PlanId, Timestamp, UserId};
use subscription_orders::domain::order::{
    NewOrder, Order, OrderNumber, OrderStatus, Plan, PlanStatus, PlanType,
};
use subscription_orders::domain::payment::{signature, NotifyPayload, PaymentSettings};
use subscription_orders::ports::OrderRepository;

const APP_ID: &str = "201906";
const APP_SECRET: &str = "http-secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    orders: Arc<InMemoryOrderStore>,
    subscriptions: Arc<InMemorySubscriptionStore>,
    plans: Arc<InMemoryPlanCatalog>,
}

impl TestApp {
    fn new() -> Self {
        let database = InMemoryDatabase::new();
        let orders = Arc::new(InMemoryOrderStore::new(database.clone()));
        let subscriptions = Arc::new(InMemorySubscriptionStore::new(database.clone()));
        let plans = Arc::new(InMemoryPlanCatalog::new());
        let settings = Arc::new(InMemoryPaymentSettings::new(PaymentSettings {
            provider: "xunhupay".to_string(),
            app_id: APP_ID.to_string(),
            app_secret: SecretString::new(APP_SECRET.to_string()),
            gateway: "https://api.xunhupay.com/payment/do.html".to_string(),
            notify_url: "https://shop.example.com/payment/xunhupay/notify".to_string(),
            return_url: String::new(),
            plugins: String::new(),
        }));

        let state = OrderAppState::new(
            orders.clone(),
            subscriptions.clone(),
            Arc::new(database),
            plans.clone(),
            settings,
            Arc::new(MockPaymentGateway::new()),
        );

        Self {
            router: orders_router(state),
            orders,
            subscriptions,
            plans,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn send_json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn add_plan(&self, id: i64, price: rust_decimal::Decimal) {
        self.plans
            .insert(Plan {
                id: PlanId::new(id).unwrap(),
                name: format!("Plan {}", id),
                status: PlanStatus::Active,
                plan_type: PlanType::Subscription,
                purchase_enabled: true,
                purchase_price: Some(price),
                default_validity_days: 30,
            })
            .await;
    }

    async fn pending_order(&self, user: &str) -> Order {
        let now = Timestamp::now();
        let order = Order::create(
            NewOrder {
                user_id: UserId::new(user).unwrap(),
                plan_id: PlanId::new(1).unwrap(),
                payment_provider: "xunhupay".to_string(),
                amount: dec!(19.90),
                currency: "CNY".to_string(),
                validity_days: 30,
                notes: String::new(),
            },
            OrderNumber::generate(&now),
            now,
        )
        .unwrap();
        self.orders.create(&order).await.unwrap();
        order
    }

    async fn status_of(&self, order: &Order) -> OrderStatus {
        self.orders.get_by_id(&order.id).await.unwrap().status
    }
}

fn notify_request(payload: &NotifyPayload) -> Request<Body> {
    let body = payload
        .signed_params()
        .into_iter()
        .chain(std::iter::once(("hash".to_string(), payload.hash.clone())))
        .map(|(key, value)| format!("{}={}", key, value.replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("&");

    Request::builder()
        .method("POST")
        .uri("/payment/xunhupay/notify")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn signed_callback(order: &Order, total_fee: &str) -> NotifyPayload {
    let mut payload = NotifyPayload {
        appid: APP_ID.to_string(),
        trade_order_id: order.order_no.to_string(),
        total_fee: total_fee.to_string(),
        transaction_id: "4200009876".to_string(),
        open_order_id: "open-9".to_string(),
        order_title: "Plan 1 30 days".to_string(),
        status: "OD".to_string(),
        time: Timestamp::now().as_unix_secs().to_string(),
        nonce_str: "z9y8x7w6v5u4t3s2".to_string(),
        ..Default::default()
    };
    payload.hash = signature::sign(&payload.signed_params(), APP_SECRET);
    payload
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("X-User-Id", user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Gateway Callback
// =============================================================================

#[tokio::test]
async fn signed_callback_answers_success_and_settles() {
    let app = TestApp::new();
    let order = app.pending_order("alice").await;

    let (status, body) = app.send(notify_request(&signed_callback(&order, "19.90"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");
    assert_eq!(app.status_of(&order).await, OrderStatus::Paid);
    assert_eq!(app.subscriptions.count().await, 1);
}

#[tokio::test]
async fn replayed_callback_still_answers_success() {
    let app = TestApp::new();
    let order = app.pending_order("alice").await;
    let callback = signed_callback(&order, "19.90");

    app.send(notify_request(&callback)).await;
    let (_, body) = app.send(notify_request(&callback)).await;

    assert_eq!(body, "success");
    assert_eq!(app.subscriptions.count().await, 1);
}

#[tokio::test]
async fn forged_callback_answers_fail() {
    let app = TestApp::new();
    let order = app.pending_order("alice").await;
    let mut callback = signed_callback(&order, "19.90");
    callback.hash = "00000000000000000000000000000000".to_string();

    let (status, body) = app.send(notify_request(&callback)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "fail");
    assert_eq!(app.status_of(&order).await, OrderStatus::Pending);
}

#[tokio::test]
async fn waiting_status_callback_is_acknowledged_without_change() {
    let app = TestApp::new();
    let order = app.pending_order("alice").await;
    let mut callback = signed_callback(&order, "19.90");
    callback.status = "WP".to_string();
    callback.hash = signature::sign(&callback.signed_params(), APP_SECRET);

    let (_, body) = app.send(notify_request(&callback)).await;

    assert_eq!(body, "success");
    assert_eq!(app.status_of(&order).await, OrderStatus::Pending);
}

#[tokio::test]
async fn callback_with_wrong_content_type_answers_fail() {
    let app = TestApp::new();
    let order = app.pending_order("alice").await;
    let callback = signed_callback(&order, "19.90");
    let request = Request::builder()
        .method("POST")
        .uri("/payment/xunhupay/notify")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&json!({
            "trade_order_id": callback.trade_order_id,
            "hash": callback.hash,
        }))
        .unwrap()))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "fail");
    assert_eq!(app.status_of(&order).await, OrderStatus::Pending);
}

#[tokio::test]
async fn callback_with_duplicated_fields_answers_fail() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/payment/xunhupay/notify")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("appid=201906&appid=201907&trade_order_id=S1"))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "fail");
}

// =============================================================================
// Caller Endpoints
// =============================================================================

#[tokio::test]
async fn purchase_requires_user_header() {
    let app = TestApp::new();
    app.add_plan(1, dec!(0)).await;

    let (status, body) = app
        .send_json(post_json("/orders", None, json!({ "plan_id": 1 })))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTHENTICATION_REQUIRED");
}

#[tokio::test]
async fn free_plan_purchase_returns_paid_order() {
    let app = TestApp::new();
    app.add_plan(1, dec!(0)).await;

    let (status, body) = app
        .send_json(post_json("/orders", Some("alice"), json!({ "plan_id": 1 })))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["paid"], true);
    assert_eq!(body["provider"], "manual");
    assert_eq!(body["order"]["status"], "paid");
    assert_eq!(body["order"]["user_id"], "alice");
}

#[tokio::test]
async fn unknown_plan_is_404() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(post_json("/orders", Some("alice"), json!({ "plan_id": 42 })))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PLAN_NOT_FOUND");
}

#[tokio::test]
async fn plans_lists_purchasable_plans() {
    let app = TestApp::new();
    app.add_plan(1, dec!(19.90)).await;
    app.add_plan(2, dec!(99)).await;

    let (status, body) = app.send_json(get("/plans", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["name"], "Plan 1");
}

#[tokio::test]
async fn other_users_order_is_not_found() {
    let app = TestApp::new();
    let order = app.pending_order("alice").await;
    let uri = format!("/orders/{}", order.id);

    let (status, _) = app.send_json(get(&uri, Some("alice"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send_json(get(&uri, Some("mallory"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ORDER_NOT_FOUND");
}

#[tokio::test]
async fn malformed_order_id_is_400() {
    let app = TestApp::new();

    let (status, body) = app.send_json(get("/orders/not-a-uuid", Some("alice"))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ORDER_INVALID_INPUT");
}

#[tokio::test]
async fn my_orders_lists_only_callers_orders() {
    let app = TestApp::new();
    app.pending_order("alice").await;
    app.pending_order("alice").await;
    app.pending_order("bob").await;

    let (status, body) = app.send_json(get("/orders?page=1&page_size=10", Some("alice"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

// =============================================================================
// Admin Endpoints
// =============================================================================

#[tokio::test]
async fn admin_can_mark_paid_then_cancel_is_refused() {
    let app = TestApp::new();
    let order = app.pending_order("alice").await;

    let (status, body) = app
        .send_json(post_empty(&format!("/admin/orders/{}/mark-paid", order.id)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paid");

    let (status, body) = app
        .send_json(post_empty(&format!("/admin/orders/{}/cancel", order.id)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ORDER_INVALID_STATUS");
}

#[tokio::test]
async fn admin_cancel_then_late_callback_fails() {
    let app = TestApp::new();
    let order = app.pending_order("alice").await;

    let (status, body) = app
        .send_json(post_empty(&format!("/admin/orders/{}/cancel", order.id)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "canceled");

    let (_, reply) = app.send(notify_request(&signed_callback(&order, "19.90"))).await;
    assert_eq!(reply, "fail");
    assert_eq!(app.subscriptions.count().await, 0);
}

#[tokio::test]
async fn admin_listing_filters_by_status() {
    let app = TestApp::new();
    let paid = app.pending_order("alice").await;
    app.pending_order("bob").await;
    app.send(post_empty(&format!("/admin/orders/{}/mark-paid", paid.id)))
        .await;

    let (status, body) = app.send_json(get("/admin/orders?status=paid", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], paid.id.to_string());
}

#[tokio::test]
async fn admin_listing_rejects_unknown_status() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(get("/admin/orders?status=refunded", None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ORDER_INVALID_INPUT");
}

#[tokio::test]
async fn admin_mark_paid_on_unknown_order_is_404() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(post_empty(&format!(
            "/admin/orders/{}/mark-paid",
            subscription_orders::domain::foundation::OrderId::new()
        )))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ORDER_NOT_FOUND");
}
