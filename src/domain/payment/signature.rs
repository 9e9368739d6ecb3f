//! Canonical MD5 signing for gateway requests and callbacks.
//!
//! The canonical string is every non-empty parameter except `hash`,
//! sorted by key bytes, rendered `k=v` and joined with `&`, with the
//! raw secret appended directly. The digest is lowercase hex MD5.
//!
//! Outbound requests, inbound callbacks and gateway responses all go
//! through the same two functions so the rule set cannot drift.

use std::collections::BTreeMap;

use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

/// Name of the digest field, excluded from its own input.
pub const HASH_FIELD: &str = "hash";

/// Builds the string that gets hashed.
pub fn canonical_string(params: &BTreeMap<String, String>, secret: &str) -> String {
    let joined = params
        .iter()
        .filter(|(key, value)| key.as_str() != HASH_FIELD && !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}{}", joined, secret)
}

/// Computes the lowercase hex digest of `params` under `secret`.
pub fn sign(params: &BTreeMap<String, String>, secret: &str) -> String {
    let digest = Md5::digest(canonical_string(params, secret).as_bytes());
    hex::encode(digest)
}

/// Checks a presented digest, ignoring hex case.
pub fn verify(params: &BTreeMap<String, String>, secret: &str, presented: &str) -> bool {
    let presented = match hex::decode(presented.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let expected = Md5::digest(canonical_string(params, secret).as_bytes());
    expected.as_slice().ct_eq(&presented).into()
}
