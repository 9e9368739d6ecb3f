//! HTTP handlers for order endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::order::{
    CancelOrderCommand, CancelOrderHandler, CreateOrderCommand, CreateOrderConfig,
    CreateOrderHandler, ExpiredOrderSweeper, GetOrderHandler, GetOrderQuery, HandleNotifyCommand,
    HandleNotifyHandler, HandleNotifyResult, ListOrdersHandler, ListOrdersQuery, ListPlansHandler,
    ListUserOrdersHandler, ListUserOrdersQuery, MarkOrderPaidCommand, MarkOrderPaidHandler,
    OrderActivator, PAYMENT_TIMEOUT,
};
use crate::domain::foundation::{OrderId, PlanId, UserId};
use crate::domain::order::OrderError;
use crate::domain::payment::NotifyPayload;
use crate::ports::{
    OrderRepository, PaymentGateway, PaymentSettingsSource, PlanReader, SubscriptionAssigner,
    UnitOfWork,
};

use super::dto::{
    AdminOrderParams, CreateOrderRequest, CreateOrderResponse, ErrorResponse, OrderPageResponse,
    OrderResponse, PageParams, PlanResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; handlers are built on demand from the
/// Arc-wrapped ports.
#[derive(Clone)]
pub struct OrderAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub subscriptions: Arc<dyn SubscriptionAssigner>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
    pub plans: Arc<dyn PlanReader>,
    pub settings: Arc<dyn PaymentSettingsSource>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub create_config: CreateOrderConfig,
    pub payment_timeout: Duration,
}

impl OrderAppState {
    /// State with default order settings and the standard payment window.
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        subscriptions: Arc<dyn SubscriptionAssigner>,
        unit_of_work: Arc<dyn UnitOfWork>,
        plans: Arc<dyn PlanReader>,
        settings: Arc<dyn PaymentSettingsSource>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            orders,
            subscriptions,
            unit_of_work,
            plans,
            settings,
            gateway,
            create_config: CreateOrderConfig::default(),
            payment_timeout: PAYMENT_TIMEOUT,
        }
    }

    pub fn with_create_config(mut self, config: CreateOrderConfig) -> Self {
        self.create_config = config;
        self
    }

    pub fn with_payment_timeout(mut self, timeout: Duration) -> Self {
        self.payment_timeout = timeout;
        self
    }

    pub fn activator(&self) -> Arc<OrderActivator> {
        Arc::new(OrderActivator::new(
            self.orders.clone(),
            self.subscriptions.clone(),
            self.unit_of_work.clone(),
        ))
    }

    pub fn sweeper(&self) -> Arc<ExpiredOrderSweeper> {
        Arc::new(ExpiredOrderSweeper::with_timeout(
            self.orders.clone(),
            self.payment_timeout,
        ))
    }

    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(
            self.plans.clone(),
            self.orders.clone(),
            self.settings.clone(),
            self.gateway.clone(),
            self.activator(),
            self.create_config.clone(),
        )
    }

    pub fn notify_handler(&self) -> HandleNotifyHandler {
        HandleNotifyHandler::new(
            self.orders.clone(),
            self.settings.clone(),
            self.gateway.clone(),
            self.activator(),
            self.sweeper(),
        )
    }

    pub fn mark_paid_handler(&self) -> MarkOrderPaidHandler {
        MarkOrderPaidHandler::new(self.orders.clone(), self.activator())
    }

    pub fn cancel_handler(&self) -> CancelOrderHandler {
        CancelOrderHandler::new(self.orders.clone(), self.unit_of_work.clone())
    }

    pub fn get_order_handler(&self) -> GetOrderHandler {
        GetOrderHandler::new(self.orders.clone(), self.sweeper())
    }

    pub fn list_orders_handler(&self) -> ListOrdersHandler {
        ListOrdersHandler::new(self.orders.clone(), self.sweeper())
    }

    pub fn list_user_orders_handler(&self) -> ListUserOrdersHandler {
        ListUserOrdersHandler::new(self.orders.clone(), self.sweeper())
    }

    pub fn list_plans_handler(&self) -> ListPlansHandler {
        ListPlansHandler::new(self.plans.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context
// ════════════════════════════════════════════════════════════════════════════════

/// Caller identity taken from the `X-User-Id` header.
///
/// Session handling lives in front of this service; by the time a request
/// arrives here the header has been set by the auth layer.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection type for AuthenticatedUser extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Gateway Callback
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payment/xunhupay/notify - Gateway payment callback
///
/// The gateway retries until it reads the literal body `success`, so every
/// outcome the handler accepts (including replays and non-paid statuses)
/// answers `success`. Anything else answers `fail`.
pub async fn xunhupay_notify(
    State(state): State<OrderAppState>,
    form: Result<Form<NotifyPayload>, FormRejection>,
) -> &'static str {
    let payload = match form {
        Ok(Form(payload)) => payload,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "payment callback body rejected");
            return "fail";
        }
    };
    let trade_order_id = payload.trade_order_id.clone();
    let handler = state.notify_handler();

    match handler.handle(HandleNotifyCommand { payload }).await {
        Ok(HandleNotifyResult::Activated(order)) => {
            tracing::info!(order_no = %order.order_no, "payment callback settled order");
            "success"
        }
        Ok(HandleNotifyResult::AlreadyPaid(_)) | Ok(HandleNotifyResult::Ignored { .. }) => "success",
        Err(err) => {
            tracing::warn!(
                trade_order_id = %trade_order_id,
                error = %err,
                "payment callback rejected"
            );
            "fail"
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// User Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /plans - Plans the caller can buy
pub async fn list_plans(
    State(state): State<OrderAppState>,
) -> Result<impl IntoResponse, OrderApiError> {
    let plans = state.list_plans_handler().handle().await?;
    let response: Vec<PlanResponse> = plans.into_iter().map(PlanResponse::from).collect();
    Ok(Json(response))
}

/// POST /orders - Purchase a plan
pub async fn create_order(
    State(state): State<OrderAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, OrderApiError> {
    let cmd = CreateOrderCommand {
        user_id: user.user_id,
        plan_id: PlanId::new(request.plan_id).map_err(OrderError::from)?,
        notes: request.notes.unwrap_or_default(),
    };

    let result = state.create_order_handler().handle(cmd).await?;
    Ok((StatusCode::CREATED, Json(CreateOrderResponse::from(result))))
}

/// GET /orders - The caller's own orders, newest first
pub async fn list_my_orders(
    State(state): State<OrderAppState>,
    user: AuthenticatedUser,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, OrderApiError> {
    let query = ListUserOrdersQuery {
        user_id: user.user_id,
        page: params.pagination(),
    };

    let page = state.list_user_orders_handler().handle(query).await?;
    Ok(Json(OrderPageResponse::from(page)))
}

/// GET /orders/:id - One of the caller's orders
pub async fn get_my_order(
    State(state): State<OrderAppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, OrderApiError> {
    let query = GetOrderQuery {
        order_id: parse_order_id(&id)?,
        owner: Some(user.user_id),
    };

    let order = state.get_order_handler().handle(query).await?;
    Ok(Json(OrderResponse::from(order)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /admin/orders - All orders with filters
pub async fn admin_list_orders(
    State(state): State<OrderAppState>,
    Query(params): Query<AdminOrderParams>,
) -> Result<impl IntoResponse, OrderApiError> {
    let query = ListOrdersQuery {
        filters: params.filters()?,
        page: params.pagination(),
    };

    let page = state.list_orders_handler().handle(query).await?;
    Ok(Json(OrderPageResponse::from(page)))
}

/// POST /admin/orders/:id/mark-paid - Settle a pending order by hand
pub async fn admin_mark_paid(
    State(state): State<OrderAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, OrderApiError> {
    let cmd = MarkOrderPaidCommand {
        order_id: parse_order_id(&id)?,
    };

    let result = state.mark_paid_handler().handle(cmd).await?;
    Ok(Json(OrderResponse::from(result.order)))
}

/// POST /admin/orders/:id/cancel - Cancel a pending order
pub async fn admin_cancel(
    State(state): State<OrderAppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, OrderApiError> {
    let cmd = CancelOrderCommand {
        order_id: parse_order_id(&id)?,
    };

    let result = state.cancel_handler().handle(cmd).await?;
    Ok(Json(OrderResponse::from(result.order)))
}

fn parse_order_id(raw: &str) -> Result<OrderId, OrderApiError> {
    raw.parse::<OrderId>()
        .map_err(|e| OrderApiError(OrderError::from(e)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts order errors to HTTP responses.
#[derive(Debug)]
pub struct OrderApiError(pub OrderError);

impl From<OrderError> for OrderApiError {
    fn from(err: OrderError) -> Self {
        Self(err)
    }
}

impl IntoResponse for OrderApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "order request failed");
        }
        let error = ErrorResponse::new(self.0.code(), self.0.to_string());
        (status, Json(error)).into_response()
    }
}
