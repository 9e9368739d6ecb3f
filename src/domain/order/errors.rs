//! Order-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | InvalidInput | 400 |
//! | InvalidPlan | 400 |
//! | InvalidStatus | 400 |
//! | PaymentNotConfigured | 400 |
//! | InvalidSignature | 400 |
//! | AmountMismatch | 400 |
//! | Gateway | 502 |
//! | Infrastructure | 500 |

use axum::http::StatusCode;
use rust_decimal::Decimal;
use thiserror::Error;

use super::OrderStatus;
use crate::domain::foundation::{DomainError, ErrorCode, PlanId, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order or plan does not exist.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Missing or malformed input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Plan fails a purchase precondition.
    #[error("Plan {plan_id} cannot be purchased: {reason}")]
    InvalidPlan { plan_id: PlanId, reason: String },

    /// Operation is illegal for the order's current status.
    #[error("Cannot {attempted} an order that is {current}")]
    InvalidStatus {
        current: OrderStatus,
        attempted: &'static str,
    },

    /// Provider, secret or gateway settings are missing.
    #[error("Payment not configured: {0}")]
    PaymentNotConfigured(String),

    /// Callback origin or digest could not be verified.
    #[error("Invalid payment signature")]
    InvalidSignature,

    /// Callback fee does not match the stored amount.
    #[error("Payment amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch { expected: Decimal, actual: String },

    /// Payment gateway call failed.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Store or transaction failure.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl OrderError {
    pub fn order_not_found(id: impl ToString) -> Self {
        OrderError::NotFound {
            resource: "order",
            id: id.to_string(),
        }
    }

    pub fn plan_not_found(id: PlanId) -> Self {
        OrderError::NotFound {
            resource: "plan",
            id: id.to_string(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        OrderError::Infrastructure(message.into())
    }

    /// Stable machine-readable kind.
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::NotFound { resource: "plan", .. } => "PLAN_NOT_FOUND",
            OrderError::NotFound { .. } => "ORDER_NOT_FOUND",
            OrderError::InvalidInput(_) => "ORDER_INVALID_INPUT",
            OrderError::InvalidPlan { .. } => "ORDER_INVALID_PLAN",
            OrderError::InvalidStatus { .. } => "ORDER_INVALID_STATUS",
            OrderError::PaymentNotConfigured(_) => "PAYMENT_NOT_CONFIGURED",
            OrderError::InvalidSignature => "PAYMENT_INVALID_SIGNATURE",
            OrderError::AmountMismatch { .. } => "PAYMENT_AMOUNT_MISMATCH",
            OrderError::Gateway(_) => "PAYMENT_GATEWAY_ERROR",
            OrderError::Infrastructure(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
            OrderError::InvalidInput(_)
            | OrderError::InvalidPlan { .. }
            | OrderError::InvalidStatus { .. }
            | OrderError::PaymentNotConfigured(_)
            | OrderError::InvalidSignature
            | OrderError::AmountMismatch { .. } => StatusCode::BAD_REQUEST,
            OrderError::Gateway(_) => StatusCode::BAD_GATEWAY,
            OrderError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true if the same call may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::Gateway(_) | OrderError::Infrastructure(_))
    }
}

impl From<ValidationError> for OrderError {
    fn from(err: ValidationError) -> Self {
        OrderError::InvalidInput(err.to_string())
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::OrderNotFound => OrderError::NotFound {
                resource: "order",
                id: err.details.get("id").cloned().unwrap_or(err.message),
            },
            ErrorCode::PlanNotFound => OrderError::NotFound {
                resource: "plan",
                id: err.details.get("id").cloned().unwrap_or(err.message),
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => OrderError::InvalidInput(err.message),
            ErrorCode::ExternalServiceError => OrderError::Gateway(err.message),
            _ => OrderError::Infrastructure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn client_errors() -> Vec<OrderError> {
        vec![
            OrderError::InvalidInput("nil order".to_string()),
            OrderError::InvalidPlan {
                plan_id: PlanId::new(1).unwrap(),
                reason: "disabled".to_string(),
            },
            OrderError::InvalidStatus {
                current: OrderStatus::Paid,
                attempted: "cancel",
            },
            OrderError::PaymentNotConfigured("app secret missing".to_string()),
            OrderError::InvalidSignature,
            OrderError::AmountMismatch {
                expected: dec!(10.00),
                actual: "1.00".to_string(),
            },
        ]
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            OrderError::order_not_found("S1").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            OrderError::plan_not_found(PlanId::new(9).unwrap()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn client_kinds_map_to_400() {
        for err in client_errors() {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{}", err);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn codes_are_distinct() {
        let mut codes: Vec<_> = client_errors().iter().map(OrderError::code).collect();
        codes.push(OrderError::order_not_found("x").code());
        codes.push(OrderError::plan_not_found(PlanId::new(1).unwrap()).code());
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn invalid_status_display_names_both_sides() {
        let err = OrderError::InvalidStatus {
            current: OrderStatus::Canceled,
            attempted: "mark paid",
        };
        assert_eq!(err.to_string(), "Cannot mark paid an order that is canceled");
    }

    #[test]
    fn domain_not_found_converts_to_not_found() {
        let err: OrderError = DomainError::new(ErrorCode::OrderNotFound, "missing")
            .with_detail("id", "S123")
            .into();
        assert_eq!(err, OrderError::order_not_found("S123"));
    }

    #[test]
    fn domain_database_error_converts_to_infrastructure() {
        let err: OrderError = DomainError::database("connection reset").into();
        assert!(matches!(err, OrderError::Infrastructure(_)));
        assert!(err.is_retryable());
    }
}
