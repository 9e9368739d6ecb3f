//! XunhuPay payment gateway adapter.
//!
//! Implements the `PaymentGateway` port:
//! - Payment creation over the form-encoded gateway API
//! - Callback digest verification
//! - Tolerant decoding of the gateway's loosely typed JSON
//!
//! All digests go through `domain::payment::signature`.

mod client;
mod mock_gateway;
mod response;

pub use client::{
    format_fee, request_params, XunhuPayClient, XunhuPayClientConfig, NONCE_LENGTH,
    PROTOCOL_VERSION,
};
pub use mock_gateway::{CreatePaymentCall, MockPaymentGateway};
pub use response::CreatePaymentResponse;
