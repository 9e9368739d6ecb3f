//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `OrderRepository` - Order storage, listing and the bulk expiry update
//! - `UnitOfWork` - Transactions shared by the order store and the subscription assigner
//!
//! ## Collaborator Ports
//!
//! - `PlanReader` - Plan catalog lookups
//! - `SubscriptionAssigner` - Opaque assign-or-extend of subscriptions
//! - `PaymentSettingsSource` - Per-operation payment settings snapshot
//! - `PaymentGateway` - Hosted checkout creation and callback verification

mod order_repository;
mod payment_gateway;
mod payment_settings_source;
mod plan_reader;
mod subscription_assigner;
mod unit_of_work;

pub use order_repository::{
    OrderFilters, OrderPage, OrderRepository, Pagination, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use payment_gateway::{PaymentError, PaymentErrorCode, PaymentGateway, PaymentLink};
pub use payment_settings_source::PaymentSettingsSource;
pub use plan_reader::PlanReader;
pub use subscription_assigner::{AssignSubscription, SubscriptionAssigner};
pub use unit_of_work::{TransactionContext, UnitOfWork};
