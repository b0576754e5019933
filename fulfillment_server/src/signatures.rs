//! Webhook signature verification.
//!
//! Stripe and Coinbase Commerce both sign the raw request body with HMAC-SHA256 using a shared secret:
//!
//! * Coinbase sends the hex digest of the body in `X-CC-Webhook-Signature`.
//! * Stripe sends `t=<unix time>,v1=<hex digest>` in `Stripe-Signature`, where the digest covers `"<t>.<body>"`. There
//!   may be several `v1` entries while a secret is being rolled.
//!
//! Digests are compared in constant time. A missing, malformed or stale signature is rejected.
use std::time::Duration;

use chrono::Utc;
use dd_common::Secret;
use fulfillment_engine::providers::{SignatureError, WebhookVerifier};
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";
pub const COINBASE_SIGNATURE_HEADER: &str = "x-cc-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// The header is the hex digest of the body
    Plain,
    /// The header is `t=..,v1=..` and the digest covers the timestamp and the body
    Stripe { tolerance: Duration },
}

#[derive(Debug, Clone)]
pub struct HmacVerifier {
    secret: Secret<String>,
    scheme: SignatureScheme,
}

impl HmacVerifier {
    pub fn new(secret: Secret<String>, scheme: SignatureScheme) -> Self {
        Self { secret, scheme }
    }

    pub fn coinbase(secret: Secret<String>) -> Self {
        Self::new(secret, SignatureScheme::Plain)
    }

    pub fn stripe(secret: Secret<String>, tolerance: Duration) -> Self {
        Self::new(secret, SignatureScheme::Stripe { tolerance })
    }

    fn mac(&self) -> Result<HmacSha256, SignatureError> {
        HmacSha256::new_from_slice(self.secret.reveal().as_bytes())
            .map_err(|e| SignatureError::Malformed(e.to_string()))
    }

    fn verify_plain(&self, payload: &[u8], signature: &str) -> Result<(), SignatureError> {
        let expected = hex::decode(signature.trim()).map_err(|e| SignatureError::Malformed(e.to_string()))?;
        let mut mac = self.mac()?;
        mac.update(payload);
        mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)
    }

    fn verify_stripe(&self, payload: &[u8], header: &str, tolerance: Duration) -> Result<(), SignatureError> {
        let parsed = StripeSignatureHeader::parse(header)?;
        let age = Utc::now().timestamp() - parsed.timestamp;
        if age.unsigned_abs() > tolerance.as_secs() {
            debug!("🔐️ Stripe signature timestamp is {age}s old");
            return Err(SignatureError::Expired);
        }
        let matched = parsed.signatures.iter().any(|sig| {
            let Ok(expected) = hex::decode(sig) else {
                return false;
            };
            let Ok(mut mac) = self.mac() else {
                return false;
            };
            mac.update(parsed.timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        });
        if matched {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

impl WebhookVerifier for HmacVerifier {
    fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let signature = signature.filter(|s| !s.trim().is_empty()).ok_or(SignatureError::Missing)?;
        match self.scheme {
            SignatureScheme::Plain => self.verify_plain(payload, signature),
            SignatureScheme::Stripe { tolerance } => self.verify_stripe(payload, signature, tolerance),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StripeSignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

impl StripeSignatureHeader {
    fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", t)) => {
                    let t = t.parse::<i64>().map_err(|e| SignatureError::Malformed(format!("timestamp: {e}")))?;
                    timestamp = Some(t);
                },
                Some(("v1", sig)) => signatures.push(sig.to_string()),
                // v0 and any future schemes are ignored
                _ => {},
            }
        }
        let timestamp = timestamp.ok_or_else(|| SignatureError::Malformed("no timestamp".into()))?;
        if signatures.is_empty() {
            return Err(SignatureError::Malformed("no v1 signature".into()));
        }
        Ok(Self { timestamp, signatures })
    }
}

/// Hex encoded HMAC-SHA256 of `payload`.
#[cfg(test)]
pub(crate) fn sign_hex(secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Builds a `Stripe-Signature` header value for `payload` at `timestamp`.
#[cfg(test)]
pub(crate) fn stripe_signature_header(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let mut signed = format!("{timestamp}.").into_bytes();
    signed.extend_from_slice(payload);
    format!("t={timestamp},v1={}", sign_hex(secret, &signed))
}
