//! Payment domain module.
//!
//! Gateway-facing rules that do not depend on any transport: the canonical
//! digest, the callback payload and the per-operation settings snapshot.

mod notify;
mod settings;
pub mod signature;

pub use notify::{NotifyPayload, STATUS_PAID};
pub use settings::{GatewayConfig, PaymentSettings, ResolvedProvider};
