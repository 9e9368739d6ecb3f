//! Integration tests for the background expiry sweeper.
//!
//! Runs `ExpiredOrderSweeper` inside a `PeriodicTask` over the in-memory
//! order store, the same way the service binary wires it.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use subscription_orders::adapters::memory::{InMemoryDatabase, InMemoryOrderStore};
use subscription_orders::adapters::scheduling::{PeriodicTask, PeriodicTaskConfig};
use subscription_orders::application::handlers::order::ExpiredOrderSweeper;
use subscription_orders::domain::foundation::{PlanId, Timestamp, UserId};
use subscription_orders::domain::order::{NewOrder, Order, OrderNumber, OrderStatus};
use subscription_orders::ports::OrderRepository;

// =============================================================================
// Test Infrastructure
// =============================================================================

async fn insert_order(store: &InMemoryOrderStore, age: Duration) -> Order {
    let created_at = Timestamp::now().minus(age);
    let order = Order::create(
        NewOrder {
            user_id: UserId::new("alice").unwrap(),
            plan_id: PlanId::new(1).unwrap(),
            payment_provider: "xunhupay".to_string(),
            amount: dec!(19.90),
            currency: "CNY".to_string(),
            validity_days: 30,
            notes: String::new(),
        },
        OrderNumber::generate(&created_at),
        created_at,
    )
    .unwrap();
    store.create(&order).await.unwrap();
    order
}

fn spawn_sweeper(store: Arc<InMemoryOrderStore>, interval: Duration) -> PeriodicTask {
    let sweeper = Arc::new(ExpiredOrderSweeper::new(store));
    PeriodicTask::spawn(
        "expired-order-sweeper",
        PeriodicTaskConfig::default()
            .with_interval(interval)
            .with_deadline(Duration::from_millis(40)),
        move || {
            let sweeper = sweeper.clone();
            async move { sweeper.sweep().await.map(|_| ()) }
        },
    )
}

async fn status_of(store: &InMemoryOrderStore, order: &Order) -> OrderStatus {
    store.get_by_id(&order.id).await.unwrap().status
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn first_run_cancels_orders_that_expired_while_down() {
    let store = Arc::new(InMemoryOrderStore::new(InMemoryDatabase::new()));
    let stale = insert_order(&store, Duration::from_secs(3600)).await;
    let fresh = insert_order(&store, Duration::from_secs(10)).await;

    let task = spawn_sweeper(store.clone(), Duration::from_secs(3600));
    tokio::time::sleep(Duration::from_millis(100)).await;
    task.stop().await;

    assert_eq!(status_of(&store, &stale).await, OrderStatus::Canceled);
    assert_eq!(status_of(&store, &fresh).await, OrderStatus::Pending);
}

#[tokio::test]
async fn later_runs_pick_up_orders_that_expire_afterwards() {
    let store = Arc::new(InMemoryOrderStore::new(InMemoryDatabase::new()));
    let task = spawn_sweeper(store.clone(), Duration::from_millis(50));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let stale = insert_order(&store, Duration::from_secs(301)).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while status_of(&store, &stale).await != OrderStatus::Canceled {
        assert!(tokio::time::Instant::now() < deadline, "sweeper never ran");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    task.stop().await;

    let stored = store.get_by_id(&stale.id).await.unwrap();
    assert!(stored.canceled_at.is_some());
}

#[tokio::test]
async fn stopped_sweeper_no_longer_touches_orders() {
    let store = Arc::new(InMemoryOrderStore::new(InMemoryDatabase::new()));
    let task = spawn_sweeper(store.clone(), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(30)).await;

    task.stop().await;
    task.stop().await;
    assert!(!task.is_running().await);

    let stale = insert_order(&store, Duration::from_secs(301)).await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(status_of(&store, &stale).await, OrderStatus::Pending);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_stops_all_wait_for_exit() {
    let store = Arc::new(InMemoryOrderStore::new(InMemoryDatabase::new()));
    let task = Arc::new(spawn_sweeper(store, Duration::from_millis(10)));
    tokio::time::sleep(Duration::from_millis(30)).await;

    let a = tokio::spawn({
        let task = task.clone();
        async move { task.stop().await }
    });
    let b = tokio::spawn({
        let task = task.clone();
        async move { task.stop().await }
    });
    a.await.unwrap();
    b.await.unwrap();

    assert!(!task.is_running().await);
}
