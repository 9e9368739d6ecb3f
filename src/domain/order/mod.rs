//! Order domain module.
//!
//! Purchase orders for subscription plans and the rules that govern
//! their settlement.
//!
//! # Module Structure
//!
//! - `aggregate` - Order aggregate entity
//! - `status` - OrderStatus state machine
//! - `order_number` - Human-traceable order numbers
//! - `plan` - Purchasable plan view and validity normalization
//! - `settlement` - Payment providers, settlement evidence and amount checks
//! - `errors` - OrderError taxonomy

mod aggregate;
mod errors;
mod order_number;
mod plan;
mod settlement;
mod status;

pub use aggregate::{NewOrder, Order};
pub use errors::OrderError;
pub use order_number::OrderNumber;
pub use plan::{normalize_validity_days, Plan, PlanStatus, PlanType, DEFAULT_VALIDITY_DAYS};
pub use settlement::{amount_matches, PaymentProvider, PaymentResult, AMOUNT_TOLERANCE};
pub use status::OrderStatus;
