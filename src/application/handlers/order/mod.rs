//! Order handlers.
//!
//! Command and query handlers for the order lifecycle:
//!
//! ## Commands
//! - Creating orders (free, manual or hosted checkout)
//! - Processing gateway payment callbacks
//! - Marking orders paid by hand
//! - Cancelling pending orders
//!
//! ## Queries
//! - Get a single order
//! - List orders (admin, per user)
//! - List purchasable plans
//!
//! ## Shared
//! - `OrderActivator` - the only way an order becomes paid
//! - `ExpiredOrderSweeper` - cancels orders past the payment window

mod activate_order;
mod cancel_order;
mod create_order;
mod get_order;
mod handle_notify;
mod list_orders;
mod list_plans;
mod mark_order_paid;
mod sweep_expired_orders;

#[cfg(test)]
mod testing;

// Shared
pub use activate_order::OrderActivator;
pub use sweep_expired_orders::{ExpiredOrderSweeper, PAYMENT_TIMEOUT};

// Commands
pub use cancel_order::{CancelOrderCommand, CancelOrderHandler, CancelOrderResult};
pub use create_order::{CreateOrderCommand, CreateOrderConfig, CreateOrderHandler, CreateOrderResult};
pub use handle_notify::{HandleNotifyCommand, HandleNotifyHandler, HandleNotifyResult};
pub use mark_order_paid::{MarkOrderPaidCommand, MarkOrderPaidHandler, MarkOrderPaidResult};

// Queries
pub use get_order::{GetOrderHandler, GetOrderQuery};
pub use list_orders::{ListOrdersHandler, ListOrdersQuery, ListUserOrdersHandler, ListUserOrdersQuery};
pub use list_plans::ListPlansHandler;
