//! Payment configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::xunhupay::XunhuPayClientConfig;
use crate::domain::order::PaymentProvider;
use crate::domain::payment::PaymentSettings;

/// Payment configuration (XunhuPay)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Active provider: empty or `manual` for offline settlement, `xunhupay` for hosted checkout
    #[serde(default)]
    pub provider: String,

    #[serde(default)]
    pub xunhupay_app_id: String,

    #[serde(default = "empty_secret")]
    pub xunhupay_app_secret: SecretString,

    /// Payment creation endpoint
    #[serde(default)]
    pub xunhupay_gateway: String,

    /// Public URL the gateway posts callbacks to
    #[serde(default)]
    pub xunhupay_notify_url: String,

    #[serde(default)]
    pub xunhupay_return_url: String,

    /// Plugin tag forwarded to the gateway (e.g. `wechat`)
    #[serde(default)]
    pub xunhupay_plugins: String,

    /// Fail gateway calls whose response digest does not verify
    #[serde(default)]
    pub strict_response_hash: bool,

    /// Gateway request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PaymentConfig {
    /// Initial payment settings snapshot
    pub fn to_settings(&self) -> PaymentSettings {
        PaymentSettings {
            provider: self.provider.clone(),
            app_id: self.xunhupay_app_id.clone(),
            app_secret: self.xunhupay_app_secret.clone(),
            gateway: self.xunhupay_gateway.clone(),
            notify_url: self.xunhupay_notify_url.clone(),
            return_url: self.xunhupay_return_url.clone(),
            plugins: self.xunhupay_plugins.clone(),
        }
    }

    /// Gateway client options
    pub fn client_config(&self) -> XunhuPayClientConfig {
        XunhuPayClientConfig::default()
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_strict_response_hash(self.strict_response_hash)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.request_timeout_secs == 0 {
            return Err(ValidationError::NotPositive("request_timeout_secs"));
        }

        let provider = self.provider.trim();
        if provider.is_empty() {
            return Ok(());
        }
        let provider = provider
            .parse::<PaymentProvider>()
            .map_err(|_| ValidationError::UnknownProvider(provider.to_string()))?;

        if provider == PaymentProvider::XunhuPay {
            if self.xunhupay_app_id.trim().is_empty() {
                return Err(ValidationError::MissingRequired("PAYMENT__XUNHUPAY_APP_ID"));
            }
            if self.xunhupay_app_secret.expose_secret().trim().is_empty() {
                return Err(ValidationError::MissingRequired("PAYMENT__XUNHUPAY_APP_SECRET"));
            }
            if !is_http_url(&self.xunhupay_gateway) {
                return Err(ValidationError::InvalidUrl("xunhupay_gateway"));
            }
            if !is_http_url(&self.xunhupay_notify_url) {
                return Err(ValidationError::InvalidUrl("xunhupay_notify_url"));
            }
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            xunhupay_app_id: String::new(),
            xunhupay_app_secret: empty_secret(),
            xunhupay_gateway: String::new(),
            xunhupay_notify_url: String::new(),
            xunhupay_return_url: String::new(),
            xunhupay_plugins: String::new(),
            strict_response_hash: false,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("https://") || value.starts_with("http://")
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_request_timeout() -> u64 {
    15
}
