//! Slack request signing (`v0` scheme).
//!
//! Every inbound Slack request carries `X-Slack-Request-Timestamp` and
//! `X-Slack-Signature: v0=<hex hmac>` headers. The signature is the
//! HMAC-SHA256 of `v0:{timestamp}:{raw body}` under the app's signing
//! secret. Requests older than five minutes are rejected to blunt replay.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("request timestamp is not a unix epoch value: {0}")]
    InvalidTimestamp(String),
    #[error("request timestamp is outside the accepted window")]
    StaleTimestamp,
    #[error("signature header is not in `v0=<hex>` form")]
    MalformedSignature,
    #[error("request signature does not match")]
    Mismatch,
}

/// Verifier over the configured signing secret. When the secret is not
/// configured the check is skipped with a warning so local setups work
/// before Slack credentials exist.
pub struct SignatureVerifier {
    signing_secret: Option<SecretString>,
}

impl SignatureVerifier {
    pub fn new(signing_secret: SecretString) -> Self {
        let configured = !signing_secret.expose_secret().trim().is_empty();
        Self { signing_secret: configured.then_some(signing_secret) }
    }

    pub fn disabled() -> Self {
        Self { signing_secret: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.signing_secret.is_some()
    }

    pub fn verify(
        &self,
        timestamp: &str,
        signature: &str,
        body: &[u8],
        now_epoch: i64,
    ) -> Result<(), SignatureError> {
        let Some(secret) = &self.signing_secret else {
            warn!(
                event_name = "system.signature.skipped",
                "slack signing secret not configured, accepting request unverified"
            );
            return Ok(());
        };

        let request_epoch = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_owned()))?;
        if (now_epoch - request_epoch).abs() > TIMESTAMP_TOLERANCE_SECS {
            return Err(SignatureError::StaleTimestamp);
        }

        let provided =
            signature.strip_prefix("v0=").ok_or(SignatureError::MalformedSignature)?;
        let provided =
            hex::decode(provided).map_err(|_| SignatureError::MalformedSignature)?;

        let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::Mismatch)?;
        mac.update(format!("v0:{}:", timestamp.trim()).as_bytes());
        mac.update(body);
        let expected = mac.finalize().into_bytes();

        if expected.ct_eq(provided.as_slice()).into() {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}
