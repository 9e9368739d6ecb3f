//! In-memory adapters.
//!
//! Back the order ports with process-local state. One `InMemoryDatabase`
//! is shared by the order store and the subscription store so that a
//! single transaction covers both.

mod database;
mod order_store;
mod plans;
mod settings;
mod subscriptions;

pub use database::InMemoryDatabase;
pub use order_store::InMemoryOrderStore;
pub use plans::InMemoryPlanCatalog;
pub use settings::InMemoryPaymentSettings;
pub use subscriptions::{InMemorySubscriptionStore, SubscriptionRecord};
