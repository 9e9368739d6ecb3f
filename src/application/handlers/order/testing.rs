//! Shared wiring for order handler tests.

use std::sync::Arc;

use rust_decimal::Decimal;
use secrecy::SecretString;

use super::*;
use crate::adapters::memory::{
    InMemoryDatabase, InMemoryOrderStore, InMemoryPaymentSettings, InMemoryPlanCatalog,
    InMemorySubscriptionStore, SubscriptionRecord,
};
use crate::adapters::xunhupay::MockPaymentGateway;
use crate::domain::foundation::{PlanId, Timestamp, UserId};
use crate::domain::order::{NewOrder, Order, OrderNumber, Plan, PlanStatus, PlanType};
use crate::domain::payment::{signature, NotifyPayload, PaymentSettings};
use crate::ports::{OrderFilters, OrderPage, OrderRepository, Pagination};

pub(crate) const APP_ID: &str = "201906";
pub(crate) const APP_SECRET: &str = "notify-secret";
pub(crate) const USER: &str = "user-1";

pub(crate) fn gateway_settings() -> PaymentSettings {
    PaymentSettings {
        provider: "xunhupay".to_string(),
        app_id: APP_ID.to_string(),
        app_secret: SecretString::new(APP_SECRET.to_string()),
        gateway: "https://api.xunhupay.com/payment/do.html".to_string(),
        notify_url: "https://shop.example.com/payment/xunhupay/notify".to_string(),
        return_url: String::new(),
        plugins: "wechat".to_string(),
    }
}

pub(crate) struct Fixture {
    pub orders: Arc<InMemoryOrderStore>,
    pub subscriptions: Arc<InMemorySubscriptionStore>,
    pub unit_of_work: Arc<InMemoryDatabase>,
    pub plans: Arc<InMemoryPlanCatalog>,
    pub settings: Arc<InMemoryPaymentSettings>,
    pub gateway: Arc<MockPaymentGateway>,
}

impl Fixture {
    /// Manual provider, no plans.
    pub fn new() -> Self {
        Self::with_settings(PaymentSettings::manual())
    }

    /// Fully configured gateway.
    pub fn with_gateway() -> Self {
        Self::with_settings(gateway_settings())
    }

    fn with_settings(settings: PaymentSettings) -> Self {
        let database = InMemoryDatabase::new();
        Self {
            orders: Arc::new(InMemoryOrderStore::new(database.clone())),
            subscriptions: Arc::new(InMemorySubscriptionStore::new(database.clone())),
            unit_of_work: Arc::new(database),
            plans: Arc::new(InMemoryPlanCatalog::new()),
            settings: Arc::new(InMemoryPaymentSettings::new(settings)),
            gateway: Arc::new(MockPaymentGateway::new()),
        }
    }

    pub fn activator(&self) -> Arc<OrderActivator> {
        Arc::new(OrderActivator::new(
            self.orders.clone(),
            self.subscriptions.clone(),
            self.unit_of_work.clone(),
        ))
    }

    pub fn sweeper(&self) -> Arc<ExpiredOrderSweeper> {
        Arc::new(ExpiredOrderSweeper::new(self.orders.clone()))
    }

    pub fn create_handler(&self) -> CreateOrderHandler {
        self.create_handler_with(CreateOrderConfig::default())
    }

    pub fn create_handler_with(&self, config: CreateOrderConfig) -> CreateOrderHandler {
        CreateOrderHandler::new(
            self.plans.clone(),
            self.orders.clone(),
            self.settings.clone(),
            self.gateway.clone(),
            self.activator(),
            config,
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

    pub fn get_handler(&self) -> GetOrderHandler {
        GetOrderHandler::new(self.orders.clone(), self.sweeper())
    }

    pub fn list_handler(&self) -> ListOrdersHandler {
        ListOrdersHandler::new(self.orders.clone(), self.sweeper())
    }

    pub fn list_user_handler(&self) -> ListUserOrdersHandler {
        ListUserOrdersHandler::new(self.orders.clone(), self.sweeper())
    }

    /// Adds an active, purchasable subscription plan named `Plan {id}`.
    pub async fn add_plan(&self, id: i64, price: Option<Decimal>, validity_days: i32) -> Plan {
        let plan = Plan {
            id: PlanId::new(id).unwrap(),
            name: format!("Plan {}", id),
            status: PlanStatus::Active,
            plan_type: PlanType::Subscription,
            purchase_enabled: true,
            purchase_price: price,
            default_validity_days: validity_days,
        };
        self.plans.insert(plan.clone()).await;
        plan
    }

    pub async fn pending_order(&self, amount: Decimal) -> Order {
        self.insert_order(USER, amount, Timestamp::now()).await
    }

    pub async fn pending_order_for(&self, user: &str, amount: Decimal) -> Order {
        self.insert_order(user, amount, Timestamp::now()).await
    }

    pub async fn pending_order_at(&self, amount: Decimal, created_at: Timestamp) -> Order {
        self.insert_order(USER, amount, created_at).await
    }

    async fn insert_order(&self, user: &str, amount: Decimal, created_at: Timestamp) -> Order {
        let order = Order::create(
            NewOrder {
                user_id: UserId::new(user).unwrap(),
                plan_id: PlanId::new(1).unwrap(),
                payment_provider: "xunhupay".to_string(),
                amount,
                currency: "CNY".to_string(),
                validity_days: 30,
                notes: String::new(),
            },
            OrderNumber::generate(&created_at),
            created_at,
        )
        .unwrap();
        self.orders.create(&order).await.unwrap();
        order
    }

    pub async fn all_orders(&self) -> OrderPage {
        self.orders
            .list(&OrderFilters::default(), Pagination::default())
            .await
            .unwrap()
    }

    pub async fn subscription_of(&self, order: &Order) -> Option<SubscriptionRecord> {
        self.subscriptions.find(&order.user_id, order.plan_id).await
    }

    /// A completed-payment callback for `order`, signed with the test secret.
    pub fn signed_notify(&self, order: &Order, total_fee: &str) -> NotifyPayload {
        let mut payload = NotifyPayload {
            appid: APP_ID.to_string(),
            trade_order_id: order.order_no.to_string(),
            total_fee: total_fee.to_string(),
            transaction_id: "wx-4200001".to_string(),
            open_order_id: "open-1".to_string(),
            order_title: "Plan 1 30 days".to_string(),
            status: "OD".to_string(),
            plugins: "wechat".to_string(),
            attach: String::new(),
            time: Timestamp::now().as_unix_secs().to_string(),
            nonce_str: "abcdefghijklmnop".to_string(),
            hash: String::new(),
        };
        self.resign(&mut payload);
        payload
    }

    pub fn resign(&self, payload: &mut NotifyPayload) {
        payload.hash = signature::sign(&payload.signed_params(), APP_SECRET);
    }
}
