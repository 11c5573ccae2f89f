//! HMAC-SHA256 signatures for payment gateway webhooks.
//!
//! Header format is `t=<unix seconds>,v1=<hex digest>`, where the digest
//! covers `"<t>.<raw body>"`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::app_error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-tiffin-signature";

pub fn sign_webhook_payload(secret: &str, timestamp: i64, body: &str) -> String {
    let mac = signed_content_mac(secret, timestamp, body);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={},v1={}", timestamp, signature)
}

/// Checks the signature header against the body and rejects payloads older
/// (or further in the future) than `tolerance_secs`.
pub fn verify_webhook_signature(
    secret: &str,
    header: &str,
    body: &str,
    now_unix: i64,
    tolerance_secs: i64,
) -> AppResult<()> {
    let (timestamp, signature) = parse_header(header).ok_or(AppError::InvalidSignature)?;

    if now_unix.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(AppError::InvalidSignature);
    }

    let expected = hex::decode(signature).map_err(|_| AppError::InvalidSignature)?;
    signed_content_mac(secret, timestamp, body)
        .verify_slice(&expected)
        .map_err(|_| AppError::InvalidSignature)
}

fn signed_content_mac(secret: &str, timestamp: i64, body: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{}.{}", timestamp, body).as_bytes());
    mac
}

fn parse_header(header: &str) -> Option<(i64, &str)> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = v.parse().ok(),
            Some(("v1", v)) => signature = Some(v),
            _ => {}
        }
    }
    Some((timestamp?, signature?))
}
