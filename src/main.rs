//! Subscription order service.
//!
//! Wires the in-memory adapters to the HTTP surface, runs the expiry
//! sweeper in the background and stops it cleanly on Ctrl-C.

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use subscription_orders::adapters::http::{orders_router, OrderAppState};
use subscription_orders::adapters::memory::{
    InMemoryDatabase, InMemoryOrderStore, InMemoryPaymentSettings, InMemoryPlanCatalog,
    InMemorySubscriptionStore,
};
use subscription_orders::adapters::scheduling::{PeriodicTask, PeriodicTaskConfig};
use subscription_orders::adapters::xunhupay::XunhuPayClient;
use subscription_orders::application::handlers::order::{CreateOrderConfig, ExpiredOrderSweeper};
use subscription_orders::config::{AppConfig, LogFormat, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let database = InMemoryDatabase::new();
    let orders = Arc::new(InMemoryOrderStore::new(database.clone()));
    let subscriptions = Arc::new(InMemorySubscriptionStore::new(database.clone()));
    let settings = Arc::new(InMemoryPaymentSettings::new(config.payment.to_settings()));
    let gateway = Arc::new(XunhuPayClient::new(config.payment.client_config())?);

    let state = OrderAppState::new(
        orders.clone(),
        subscriptions,
        Arc::new(database),
        Arc::new(InMemoryPlanCatalog::new()),
        settings,
        gateway,
    )
    .with_create_config(CreateOrderConfig {
        max_validity_days: config.orders.max_validity_days,
        currency: config.orders.currency.clone(),
    })
    .with_payment_timeout(config.orders.payment_timeout());

    let sweeper = Arc::new(ExpiredOrderSweeper::with_timeout(
        orders,
        config.orders.payment_timeout(),
    ));
    let sweep_task = PeriodicTask::spawn(
        "expired-order-sweeper",
        PeriodicTaskConfig::default()
            .with_interval(config.orders.sweep_interval())
            .with_deadline(config.orders.sweep_deadline()),
        move || {
            let sweeper = sweeper.clone();
            async move { sweeper.sweep().await.map(|_| ()) }
        },
    );

    let app = orders_router(state).layer(TraceLayer::new_for_http());
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        provider = %config.payment.provider,
        "subscription order service listening"
    );
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweep_task.stop().await;
    tracing::info!("subscription order service stopped");

    served?;
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_new(&server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match server.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
