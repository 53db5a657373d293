//! Webhook signature verification.
//!
//! The provider sends `t=<unix seconds>,v1=<hex>` where the hex value is
//! HMAC-SHA256 over `"{t}.{raw body}"` keyed with the endpoint secret.

use std::time::Duration;

use hmac::digest::InvalidLength;
use jiff::Timestamp;
use thiserror::Error;

use crate::{
    errors::{Classify, ErrorClass},
    secrets::{Secret, hmac_sha256_hex, signatures_match},
};

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature header is missing or malformed")]
    MalformedHeader,

    #[error("signature timestamp is outside the tolerance window")]
    Expired,

    #[error("signature does not match payload")]
    Mismatch,

    #[error("webhook signing key is invalid")]
    InvalidKey(#[from] InvalidLength),
}

impl Classify for SignatureError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::MalformedHeader | Self::Expired | Self::Mismatch => ErrorClass::Authentication,
            Self::InvalidKey(_) => ErrorClass::Unavailable,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Secret,
    tolerance: Duration,
}

struct SignatureHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<SignatureHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) if !value.is_empty() => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(SignatureHeader {
            timestamp,
            signatures,
        }),
        _ => Err(SignatureError::MalformedHeader),
    }
}

impl WebhookVerifier {
    #[must_use]
    pub fn new(secret: Secret, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    fn expected(&self, timestamp: i64, payload: &[u8]) -> Result<String, SignatureError> {
        let mut message = format!("{timestamp}.").into_bytes();

        message.extend_from_slice(payload);

        Ok(hmac_sha256_hex(self.secret.as_bytes(), &message)?)
    }

    /// Verify `header` against the raw request body at time `now`.
    pub fn verify(
        &self,
        payload: &[u8],
        header: &str,
        now: Timestamp,
    ) -> Result<(), SignatureError> {
        let header = parse_header(header)?;

        let age = now.as_second().abs_diff(header.timestamp);

        if age > self.tolerance.as_secs() {
            return Err(SignatureError::Expired);
        }

        let expected = self.expected(header.timestamp, payload)?;

        if header
            .signatures
            .iter()
            .any(|provided| signatures_match(&expected, provided))
        {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }

    /// Produce a header value for `payload` signed at `timestamp`.
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> Result<String, SignatureError> {
        let signature = self.expected(timestamp, payload)?;

        Ok(format!("t={timestamp},v1={signature}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = br#"{"type":"checkout.session.completed"}"#;

    fn verifier() -> WebhookVerifier {
        WebhookVerifier::new(Secret::new("whsec_test"), Duration::from_secs(300))
    }

    #[test]
    fn accepts_fresh_valid_signature() -> Result<(), SignatureError> {
        let now = Timestamp::now();
        let header = verifier().sign(PAYLOAD, now.as_second())?;

        verifier().verify(PAYLOAD, &header, now)
    }

    #[test]
    fn rejects_tampered_payload() -> Result<(), SignatureError> {
        let now = Timestamp::now();
        let header = verifier().sign(PAYLOAD, now.as_second())?;

        let result = verifier().verify(br#"{"type":"charge.refunded"}"#, &header, now);

        assert!(matches!(result, Err(SignatureError::Mismatch)), "got {result:?}");

        Ok(())
    }

    #[test]
    fn rejects_old_timestamp_even_with_valid_signature() -> Result<(), SignatureError> {
        let now = Timestamp::now();
        let header = verifier().sign(PAYLOAD, now.as_second() - 600)?;

        let result = verifier().verify(PAYLOAD, &header, now);

        assert!(matches!(result, Err(SignatureError::Expired)), "got {result:?}");

        Ok(())
    }

    #[test]
    fn rejects_wrong_secret() -> Result<(), SignatureError> {
        let now = Timestamp::now();
        let other = WebhookVerifier::new(Secret::new("whsec_other"), Duration::from_secs(300));
        let header = other.sign(PAYLOAD, now.as_second())?;

        let result = verifier().verify(PAYLOAD, &header, now);

        assert!(matches!(result, Err(SignatureError::Mismatch)), "got {result:?}");

        Ok(())
    }

    #[test]
    fn accepts_any_matching_v1_entry() -> Result<(), SignatureError> {
        let now = Timestamp::now();
        let signed = verifier().sign(PAYLOAD, now.as_second())?;
        let header = signed.replacen(",v1=", ",v1=deadbeef,v1=", 1);

        verifier().verify(PAYLOAD, &header, now)
    }

    #[test]
    fn rejects_malformed_headers() {
        for header in ["", "garbage", "t=123", "v1=abc", "t=abc,v1=abc"] {
            let result = verifier().verify(PAYLOAD, header, Timestamp::now());

            assert!(
                matches!(result, Err(SignatureError::MalformedHeader)),
                "{header:?} should be malformed, got {result:?}"
            );
        }
    }
}
