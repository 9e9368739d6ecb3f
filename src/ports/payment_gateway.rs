//! Payment gateway port.
//!
//! Creates hosted-checkout payments and verifies gateway callbacks.
//! Configuration arrives with each call instead of living in the
//! implementation, so settings edits take effect on the next request.
//!
//! Implementations do not retry. A failed creation is reported as-is and
//! the caller decides what to do with the order.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::domain::order::{Order, OrderError};
use crate::domain::payment::{GatewayConfig, NotifyPayload};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers `order` with the gateway and returns where to pay.
    async fn create_payment(
        &self,
        config: &GatewayConfig,
        order: &Order,
        title: &str,
    ) -> Result<PaymentLink, PaymentError>;

    /// Checks a callback's digest against `secret`.
    fn verify_notify(&self, payload: &NotifyPayload, secret: &SecretString) -> bool;
}

/// Where the buyer completes payment. At least one of `url`/`qr_code` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub open_id: String,
    pub url: String,
    pub qr_code: String,
}

/// Error from a payment gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,

    /// Gateway's own error code (if available).
    pub provider_code: Option<String>,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::DecodeError, message)
    }

    pub fn rejected(provider_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::Rejected, message).with_provider_code(provider_code)
    }

    pub fn missing_payment_url() -> Self {
        Self::new(
            PaymentErrorCode::MissingPaymentUrl,
            "gateway response has neither url nor url_qrcode",
        )
    }

    pub fn invalid_response_signature() -> Self {
        Self::new(
            PaymentErrorCode::InvalidResponseSignature,
            "gateway response hash does not verify",
        )
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.provider_code {
            Some(code) => write!(f, "{} ({}): {}", self.code, code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for OrderError {
    fn from(err: PaymentError) -> Self {
        OrderError::Gateway(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Transport failure or timeout.
    NetworkError,

    /// Response body was not the expected JSON.
    DecodeError,

    /// Gateway returned a nonzero error code.
    Rejected,

    /// Success response without any payment URL.
    MissingPaymentUrl,

    /// Response digest failed verification in strict mode.
    InvalidResponseSignature,
}

impl PaymentErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentErrorCode::NetworkError)
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::DecodeError => "decode_error",
            PaymentErrorCode::Rejected => "rejected",
            PaymentErrorCode::MissingPaymentUrl => "missing_payment_url",
            PaymentErrorCode::InvalidResponseSignature => "invalid_response_signature",
        };
        write!(f, "{}", s)
    }
}
