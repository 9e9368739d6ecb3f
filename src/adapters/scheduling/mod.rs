//! Background scheduling.

mod periodic_task;

pub use periodic_task::{PeriodicTask, PeriodicTaskConfig};
