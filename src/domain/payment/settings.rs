//! Payment settings snapshot and provider resolution.
//!
//! Settings are read once per operation and passed explicitly to the
//! code that needs them; nothing here caches or mutates global state.

use secrecy::{ExposeSecret, SecretString};

use crate::domain::order::{OrderError, PaymentProvider};

/// Point-in-time view of the payment settings.
#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// Configured provider name; blank means manual.
    pub provider: String,
    pub app_id: String,
    pub app_secret: SecretString,
    pub gateway: String,
    pub notify_url: String,
    pub return_url: String,
    pub plugins: String,
}

/// Everything the gateway client needs for one request.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub app_id: String,
    pub app_secret: SecretString,
    pub gateway_url: String,
    pub notify_url: String,
    pub return_url: Option<String>,
    pub plugins: Option<String>,
}

/// Outcome of provider resolution for a chargeable order.
#[derive(Debug, Clone)]
pub enum ResolvedProvider {
    Manual,
    XunhuPay(GatewayConfig),
}

impl ResolvedProvider {
    pub fn provider(&self) -> PaymentProvider {
        match self {
            ResolvedProvider::Manual => PaymentProvider::Manual,
            ResolvedProvider::XunhuPay(_) => PaymentProvider::XunhuPay,
        }
    }
}

impl PaymentSettings {
    /// Settings with no gateway configured.
    pub fn manual() -> Self {
        Self {
            provider: PaymentProvider::Manual.as_str().to_string(),
            app_id: String::new(),
            app_secret: SecretString::new(String::new()),
            gateway: String::new(),
            notify_url: String::new(),
            return_url: String::new(),
            plugins: String::new(),
        }
    }

    /// Picks the provider for an order with a positive amount.
    ///
    /// A blank provider means manual. The gateway requires app id,
    /// secret, gateway URL and notify URL.
    pub fn resolve(&self) -> Result<ResolvedProvider, OrderError> {
        let name = self.provider.trim();
        if name.is_empty() {
            return Ok(ResolvedProvider::Manual);
        }

        let provider = name
            .parse::<PaymentProvider>()
            .map_err(|_| OrderError::PaymentNotConfigured(format!("unknown provider '{}'", name)))?;

        match provider {
            PaymentProvider::Manual => Ok(ResolvedProvider::Manual),
            PaymentProvider::XunhuPay => {
                let missing = [
                    ("app id", self.app_id.trim().is_empty()),
                    ("app secret", self.app_secret.expose_secret().trim().is_empty()),
                    ("gateway url", self.gateway.trim().is_empty()),
                    ("notify url", self.notify_url.trim().is_empty()),
                ]
                .into_iter()
                .filter(|(_, blank)| *blank)
                .map(|(field, _)| field)
                .collect::<Vec<_>>();

                if !missing.is_empty() {
                    return Err(OrderError::PaymentNotConfigured(format!(
                        "xunhupay is missing {}",
                        missing.join(", ")
                    )));
                }

                Ok(ResolvedProvider::XunhuPay(GatewayConfig {
                    app_id: self.app_id.trim().to_string(),
                    app_secret: self.app_secret.clone(),
                    gateway_url: self.gateway.trim().to_string(),
                    notify_url: self.notify_url.trim().to_string(),
                    return_url: optional(&self.return_url),
                    plugins: optional(&self.plugins),
                }))
            }
        }
    }

    /// Credentials for verifying callbacks.
    ///
    /// Requires the gateway to be the configured provider and its secret set.
    pub fn notify_credentials(&self) -> Result<(&str, &SecretString), OrderError> {
        let is_gateway = matches!(
            self.provider.trim().parse::<PaymentProvider>(),
            Ok(PaymentProvider::XunhuPay)
        );
        if !is_gateway {
            return Err(OrderError::PaymentNotConfigured(
                "xunhupay is not the configured provider".to_string(),
            ));
        }
        if self.app_secret.expose_secret().trim().is_empty() {
            return Err(OrderError::PaymentNotConfigured(
                "xunhupay app secret is not set".to_string(),
            ));
        }
        Ok((self.app_id.trim(), &self.app_secret))
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
