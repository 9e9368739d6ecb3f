//! HTTP adapters - REST API implementations.

pub mod orders;

pub use orders::{orders_router, OrderAppState};
