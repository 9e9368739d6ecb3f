//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `xunhupay` - Payment gateway client and a scriptable mock
//! - `memory` - In-memory order store, subscriptions, plans and settings
//! - `scheduling` - Cancellable periodic background jobs
//! - `http` - Axum routes for the order service

pub mod http;
pub mod memory;
pub mod scheduling;
pub mod xunhupay;

pub use memory::{
    InMemoryDatabase, InMemoryOrderStore, InMemoryPaymentSettings, InMemoryPlanCatalog,
    InMemorySubscriptionStore,
};
pub use scheduling::{PeriodicTask, PeriodicTaskConfig};
pub use xunhupay::{MockPaymentGateway, XunhuPayClient, XunhuPayClientConfig};
