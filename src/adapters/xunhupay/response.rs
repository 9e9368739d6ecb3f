//! Loosely typed gateway response.
//!
//! The gateway mixes numeric and textual encodings for the same field
//! and omits fields freely, so the body is read as a JSON object and
//! every value is normalized to trimmed text.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::domain::payment::signature::HASH_FIELD;
use crate::ports::PaymentError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentResponse {
    pub open_id: String,
    pub url: String,
    pub url_qrcode: String,
    /// Zero on success. Unparseable codes become `-1`.
    pub errcode: i64,
    pub errmsg: String,
    pub hash: String,
    fields: Map<String, Value>,
}

impl CreatePaymentResponse {
    pub fn parse(body: &str) -> Result<Self, PaymentError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| PaymentError::decode(format!("decode xunhupay response: {}", e)))?;
        let fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(PaymentError::decode(format!(
                    "decode xunhupay response: expected object, got {}",
                    type_name(&other)
                )))
            }
        };

        let text = |key: &str| fields.get(key).map(value_to_string).unwrap_or_default();

        Ok(Self {
            open_id: text("openid"),
            url: text("url"),
            url_qrcode: text("url_qrcode"),
            errcode: fields.get("errcode").map(parse_code).unwrap_or(0),
            errmsg: text("errmsg"),
            hash: text(HASH_FIELD),
            fields,
        })
    }

    pub fn is_success(&self) -> bool {
        self.errcode == 0
    }

    pub fn has_payment_url(&self) -> bool {
        !self.url.is_empty() || !self.url_qrcode.is_empty()
    }

    /// Every non-empty field except `hash`, rendered as text.
    pub fn signed_params(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != HASH_FIELD)
            .map(|(key, value)| (key.clone(), value_to_string(value)))
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn parse_code(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(-1),
        Value::String(s) if s.trim().is_empty() => 0,
        Value::String(s) => s.trim().parse().unwrap_or(-1),
        _ => -1,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
