//! In-memory payment settings.
//!
//! Holds the current settings behind a lock so they can be replaced at
//! runtime; every read hands out an independent snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::domain::payment::PaymentSettings;
use crate::ports::PaymentSettingsSource;

#[derive(Clone)]
pub struct InMemoryPaymentSettings {
    current: Arc<RwLock<PaymentSettings>>,
}

impl InMemoryPaymentSettings {
    pub fn new(settings: PaymentSettings) -> Self {
        Self {
            current: Arc::new(RwLock::new(settings)),
        }
    }

    /// Swaps in new settings; later operations see them.
    pub async fn replace(&self, settings: PaymentSettings) {
        *self.current.write().await = settings;
    }
}

impl Default for InMemoryPaymentSettings {
    fn default() -> Self {
        Self::new(PaymentSettings::manual())
    }
}

#[async_trait]
impl PaymentSettingsSource for InMemoryPaymentSettings {
    async fn payment_settings(&self) -> Result<PaymentSettings, DomainError> {
        Ok(self.current.read().await.clone())
    }
}
