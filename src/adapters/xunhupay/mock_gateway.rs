//! Mock payment gateway for testing.
//!
//! Records every `create_payment` call, can be told to fail, and verifies
//! callbacks with the real canonical digest so signed test payloads
//! behave exactly as in production.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::order::{Order, OrderNumber};
use crate::domain::payment::signature;
use crate::domain::payment::{GatewayConfig, NotifyPayload};
use crate::ports::{PaymentError, PaymentGateway, PaymentLink};

/// Recorded `create_payment` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentCall {
    pub order_no: OrderNumber,
    pub title: String,
    pub app_id: String,
}

#[derive(Default)]
struct MockState {
    calls: Vec<CreatePaymentCall>,
    next_error: Option<PaymentError>,
    next_link: Option<PaymentLink>,
}

#[derive(Default, Clone)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock whose next `create_payment` fails with `error`.
    pub fn failing(error: PaymentError) -> Self {
        let mock = Self::new();
        mock.set_error(error);
        mock
    }

    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    pub fn set_link(&self, link: PaymentLink) {
        self.state().next_link = Some(link);
    }

    pub fn calls(&self) -> Vec<CreatePaymentCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment(
        &self,
        config: &GatewayConfig,
        order: &Order,
        title: &str,
    ) -> Result<PaymentLink, PaymentError> {
        let mut state = self.state();
        state.calls.push(CreatePaymentCall {
            order_no: order.order_no.clone(),
            title: title.to_string(),
            app_id: config.app_id.clone(),
        });

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(state.next_link.clone().unwrap_or_else(|| PaymentLink {
            open_id: format!("open-{}", order.order_no),
            url: format!("https://pay.example.com/{}", order.order_no),
            qr_code: format!("weixin://wxpay/{}", order.order_no),
        }))
    }

    fn verify_notify(&self, payload: &NotifyPayload, secret: &SecretString) -> bool {
        signature::verify(&payload.signed_params(), secret.expose_secret(), &payload.hash)
    }
}
