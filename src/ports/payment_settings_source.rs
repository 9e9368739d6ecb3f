//! Payment settings port.
//!
//! Settings may change at runtime (e.g. edited by an admin), so callers
//! read a fresh snapshot once per operation and pass it along.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::PaymentSettings;

#[async_trait]
pub trait PaymentSettingsSource: Send + Sync {
    async fn payment_settings(&self) -> Result<PaymentSettings, DomainError>;
}
