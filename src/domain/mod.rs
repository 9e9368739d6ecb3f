//! Domain layer - pure order settlement rules with no I/O.

pub mod foundation;
pub mod order;
pub mod payment;
