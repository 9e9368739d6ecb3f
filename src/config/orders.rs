//! Order lifecycle configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Order lifecycle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OrdersConfig {
    /// Upper bound for a plan's validity days
    #[serde(default = "default_max_validity_days")]
    pub max_validity_days: i32,

    /// Seconds a pending order waits for payment
    #[serde(default = "default_payment_timeout")]
    pub payment_timeout_secs: u64,

    /// Seconds between background sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Upper bound on one sweep, in seconds
    #[serde(default = "default_sweep_deadline")]
    pub sweep_deadline_secs: u64,

    /// Currency code stamped on new orders
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl OrdersConfig {
    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn sweep_deadline(&self) -> Duration {
        Duration::from_secs(self.sweep_deadline_secs)
    }

    /// Validate order configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_validity_days <= 0 {
            return Err(ValidationError::NotPositive("max_validity_days"));
        }
        if self.payment_timeout_secs == 0 {
            return Err(ValidationError::NotPositive("payment_timeout_secs"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::NotPositive("sweep_interval_secs"));
        }
        if self.sweep_deadline_secs == 0 {
            return Err(ValidationError::NotPositive("sweep_deadline_secs"));
        }
        if self.sweep_deadline_secs >= self.sweep_interval_secs {
            return Err(ValidationError::DeadlineExceedsInterval);
        }
        if self.currency.trim().is_empty() {
            return Err(ValidationError::MissingRequired("ORDERS__CURRENCY"));
        }
        Ok(())
    }
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            max_validity_days: default_max_validity_days(),
            payment_timeout_secs: default_payment_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            sweep_deadline_secs: default_sweep_deadline(),
            currency: default_currency(),
        }
    }
}

fn default_max_validity_days() -> i32 {
    36500
}

fn default_payment_timeout() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_sweep_deadline() -> u64 {
    10
}

fn default_currency() -> String {
    "CNY".to_string()
}
