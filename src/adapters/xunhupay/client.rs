//! XunhuPay gateway client.
//!
//! Implements the `PaymentGateway` port over XunhuPay's form-encoded
//! `payment/do.html` API.
//!
//! # Response digests
//!
//! Some gateway deployments sign success responses with a digest that
//! does not verify. By default a mismatch is logged and counted, and the
//! call proceeds. With `strict_response_hash` the call fails instead.
//!
//! # Configuration
//!
//! ```ignore
//! let client = XunhuPayClient::new(XunhuPayClientConfig::default())?;
//! let link = client.create_payment(&gateway_config, &order, "Pro 30 days").await?;
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use secrecy::{ExposeSecret, SecretString};

use super::response::CreatePaymentResponse;
use crate::domain::foundation::Timestamp;
use crate::domain::order::Order;
use crate::domain::payment::signature::{self, HASH_FIELD};
use crate::domain::payment::{GatewayConfig, NotifyPayload};
use crate::ports::{PaymentError, PaymentGateway, PaymentLink};

/// Protocol version sent with every request.
pub const PROTOCOL_VERSION: &str = "1.1";

/// Length of the random `nonce_str`.
pub const NONCE_LENGTH: usize = 16;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct XunhuPayClientConfig {
    /// Whole-request timeout.
    pub request_timeout: Duration,

    /// Fail when a response digest does not verify.
    pub strict_response_hash: bool,
}

impl Default for XunhuPayClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            strict_response_hash: false,
        }
    }
}

impl XunhuPayClientConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_strict_response_hash(mut self, strict: bool) -> Self {
        self.strict_response_hash = strict;
        self
    }
}

pub struct XunhuPayClient {
    http_client: reqwest::Client,
    config: XunhuPayClientConfig,
    response_hash_mismatches: AtomicU64,
}

impl XunhuPayClient {
    pub fn new(config: XunhuPayClientConfig) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PaymentError::network(format!("build http client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
            response_hash_mismatches: AtomicU64::new(0),
        })
    }

    /// Responses whose digest failed verification since startup.
    pub fn response_hash_mismatches(&self) -> u64 {
        self.response_hash_mismatches.load(Ordering::Relaxed)
    }

    fn check_response_hash(
        &self,
        response: &CreatePaymentResponse,
        secret: &SecretString,
        order: &Order,
    ) -> Result<(), PaymentError> {
        if response.hash.is_empty() {
            return Ok(());
        }
        if signature::verify(&response.signed_params(), secret.expose_secret(), &response.hash) {
            return Ok(());
        }

        let total = self.response_hash_mismatches.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::warn!(
            order_no = %order.order_no,
            errcode = response.errcode,
            errmsg = %response.errmsg,
            openid = %response.open_id,
            url = %response.url,
            url_qrcode = %response.url_qrcode,
            hash = %response.hash,
            mismatches_total = total,
            strict = self.config.strict_response_hash,
            "xunhupay response hash mismatch"
        );

        if self.config.strict_response_hash {
            Err(PaymentError::invalid_response_signature())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PaymentGateway for XunhuPayClient {
    async fn create_payment(
        &self,
        config: &GatewayConfig,
        order: &Order,
        title: &str,
    ) -> Result<PaymentLink, PaymentError> {
        let mut params = request_params(config, order, title, Timestamp::now(), &random_nonce());
        let digest = signature::sign(&params, config.app_secret.expose_secret());
        params.insert(HASH_FIELD.to_string(), digest);

        tracing::debug!(
            order_no = %order.order_no,
            total_fee = %params.get("total_fee").map(String::as_str).unwrap_or_default(),
            "creating xunhupay payment"
        );

        let response = self
            .http_client
            .post(&config.gateway_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::network(format!("xunhupay request: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::network(format!("xunhupay response body: {}", e)))?;

        let parsed = CreatePaymentResponse::parse(&body).map_err(|mut err| {
            err.message = format!("{} (HTTP {})", err.message, status.as_u16());
            err
        })?;

        if !parsed.is_success() {
            tracing::error!(
                order_no = %order.order_no,
                errcode = parsed.errcode,
                errmsg = %parsed.errmsg,
                "xunhupay rejected payment"
            );
            return Err(PaymentError::rejected(
                parsed.errcode.to_string(),
                format!("xunhupay error: {}", parsed.errmsg),
            ));
        }

        self.check_response_hash(&parsed, &config.app_secret, order)?;

        if !parsed.has_payment_url() {
            return Err(PaymentError::missing_payment_url());
        }

        Ok(PaymentLink {
            open_id: parsed.open_id,
            url: parsed.url,
            qr_code: parsed.url_qrcode,
        })
    }

    fn verify_notify(&self, payload: &NotifyPayload, secret: &SecretString) -> bool {
        signature::verify(&payload.signed_params(), secret.expose_secret(), &payload.hash)
    }
}

/// Unsigned request parameters for `order`.
pub fn request_params(
    config: &GatewayConfig,
    order: &Order,
    title: &str,
    now: Timestamp,
    nonce: &str,
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("version".to_string(), PROTOCOL_VERSION.to_string());
    params.insert("appid".to_string(), config.app_id.clone());
    params.insert("trade_order_id".to_string(), order.order_no.to_string());
    params.insert("total_fee".to_string(), format_fee(order.amount));
    params.insert("title".to_string(), title.to_string());
    params.insert("time".to_string(), now.as_unix_secs().to_string());
    params.insert("notify_url".to_string(), config.notify_url.clone());
    params.insert("nonce_str".to_string(), nonce.to_string());
    if let Some(return_url) = &config.return_url {
        params.insert("return_url".to_string(), return_url.clone());
    }
    if let Some(plugins) = &config.plugins {
        params.insert("plugins".to_string(), plugins.clone());
    }
    params
}

/// Renders an amount with exactly two decimals.
pub fn format_fee(amount: Decimal) -> String {
    let mut fee = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    fee.rescale(2);
    fee.to_string()
}

fn random_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{PlanId, UserId};
    use crate::domain::order::{NewOrder, OrderNumber};
    use rust_decimal_macros::dec;

    fn gateway_config() -> GatewayConfig {
        GatewayConfig {
            app_id: "201906".to_string(),
            app_secret: SecretString::new("secret".to_string()),
            gateway_url: "http://127.0.0.1:9/payment/do.html".to_string(),
            notify_url: "https://shop.example.com/notify".to_string(),
            return_url: None,
            plugins: Some("wechat".to_string()),
        }
    }

    fn order(amount: Decimal) -> Order {
        let now = Timestamp::now();
        Order::create(
            NewOrder {
                user_id: UserId::new("user-1").unwrap(),
                plan_id: PlanId::new(1).unwrap(),
                payment_provider: "xunhupay".to_string(),
                amount,
                currency: "CNY".to_string(),
                validity_days: 30,
                notes: String::new(),
            },
            OrderNumber::new("S20240305070809a1b2c3").unwrap(),
            now,
        )
        .unwrap()
    }

    #[test]
    fn fee_always_has_two_decimals() {
        assert_eq!(format_fee(dec!(19.9)), "19.90");
        assert_eq!(format_fee(dec!(5)), "5.00");
        assert_eq!(format_fee(dec!(0.005)), "0.01");
        assert_eq!(format_fee(dec!(12.344)), "12.34");
    }

    #[test]
    fn request_params_carry_required_fields() {
        let params = request_params(
            &gateway_config(),
            &order(dec!(19.9)),
            "Pro 30 days",
            Timestamp::now(),
            "abcdefghijklmnop",
        );

        assert_eq!(params["version"], "1.1");
        assert_eq!(params["appid"], "201906");
        assert_eq!(params["trade_order_id"], "S20240305070809a1b2c3");
        assert_eq!(params["total_fee"], "19.90");
        assert_eq!(params["title"], "Pro 30 days");
        assert_eq!(params["notify_url"], "https://shop.example.com/notify");
        assert_eq!(params["plugins"], "wechat");
        assert!(!params.contains_key("return_url"));
        assert!(!params.contains_key("hash"));
        assert!(params["time"].parse::<i64>().is_ok());
    }

    #[test]
    fn nonce_is_sixteen_alphanumerics() {
        let nonce = random_nonce();
        assert_eq!(nonce.len(), NONCE_LENGTH);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn verify_notify_uses_canonical_digest() {
        let client = XunhuPayClient::new(XunhuPayClientConfig::default()).unwrap();
        let secret = SecretString::new("secret".to_string());
        let mut payload = NotifyPayload {
            appid: "201906".to_string(),
            trade_order_id: "S1".to_string(),
            total_fee: "19.90".to_string(),
            status: "OD".to_string(),
            ..Default::default()
        };
        payload.hash = signature::sign(&payload.signed_params(), "secret");

        assert!(client.verify_notify(&payload, &secret));

        payload.total_fee = "1.90".to_string();
        assert!(!client.verify_notify(&payload, &secret));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_network_error() {
        let client = XunhuPayClient::new(
            XunhuPayClientConfig::default().with_request_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let err = client
            .create_payment(&gateway_config(), &order(dec!(1)), "t")
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::ports::PaymentErrorCode::NetworkError);
        assert_eq!(client.response_hash_mismatches(), 0);
    }
}
