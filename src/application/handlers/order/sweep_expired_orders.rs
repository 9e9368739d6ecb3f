//! ExpiredOrderSweeper - Cancels pending orders that outlived the payment window.
//!
//! Runs periodically in the background and opportunistically at the start
//! of reads and callbacks. The cancellation is one bulk update filtered on
//! `pending`, so an order that an activation has already settled is never
//! matched.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::domain::order::OrderError;
use crate::ports::OrderRepository;

/// How long a pending order waits for payment before it is canceled.
pub const PAYMENT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub struct ExpiredOrderSweeper {
    orders: Arc<dyn OrderRepository>,
    payment_timeout: Duration,
}

impl ExpiredOrderSweeper {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self::with_timeout(orders, PAYMENT_TIMEOUT)
    }

    pub fn with_timeout(orders: Arc<dyn OrderRepository>, payment_timeout: Duration) -> Self {
        Self {
            orders,
            payment_timeout,
        }
    }

    pub fn payment_timeout(&self) -> Duration {
        self.payment_timeout
    }

    /// Cancels every pending order created before now minus the timeout.
    pub async fn sweep(&self) -> Result<u64, OrderError> {
        self.sweep_at(Timestamp::now()).await
    }

    /// Same as `sweep`, measured from `now`.
    pub async fn sweep_at(&self, now: Timestamp) -> Result<u64, OrderError> {
        let cutoff = now.minus(self.payment_timeout);
        let canceled = self.orders.cancel_expired_pending(cutoff, now).await?;
        if canceled > 0 {
            tracing::info!(canceled, "canceled {} expired pending orders", canceled);
        }
        Ok(canceled)
    }

    /// Sweeps, logging instead of returning any failure.
    pub async fn sweep_best_effort(&self) {
        if let Err(e) = self.sweep().await {
            tracing::warn!(error = %e, "expired order sweep failed");
        }
    }
}
