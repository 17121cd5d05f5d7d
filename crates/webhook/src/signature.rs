//! Push Notification Signature Verification
//!
//! The signed content is the canonical string built from a fixed list of
//! envelope fields. The signature is RSA PKCS#1 v1.5 over its digest, checked
//! with the public key of the certificate named in `SigningCertURL`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Url;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::certificate::{public_key_from_pem, CertificateFetcher};
use crate::envelope::WebhookEnvelope;
use crate::WebhookError;

/// Webhook authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Upper bound on the certificate fetch (seconds)
    pub certificate_timeout_secs: u64,
    /// Hosts (or parent domains) allowed to serve signing certificates; empty disables the check
    pub allowed_certificate_hosts: Vec<String>,
    /// Reject certificate URLs not served over https
    pub require_https_certificate: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            certificate_timeout_secs: 5,
            allowed_certificate_hosts: vec!["amazonaws.com".to_string()],
            require_https_certificate: true,
        }
    }
}

impl WebhookConfig {
    pub fn certificate_timeout(&self) -> Duration {
        Duration::from_secs(self.certificate_timeout_secs)
    }
}

/// Digest used by the envelope's `SignatureVersion`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVersion {
    /// SHA-1 (version "1", also assumed when the field is absent)
    Sha1,
    /// SHA-256 (version "2")
    Sha256,
}

impl SignatureVersion {
    pub fn of(envelope: &WebhookEnvelope) -> Result<Self, WebhookError> {
        match envelope.signature_version.as_deref() {
            None | Some("1") => Ok(SignatureVersion::Sha1),
            Some("2") => Ok(SignatureVersion::Sha256),
            Some(other) => Err(WebhookError::Authentication(format!(
                "unsupported signature version {}",
                other
            ))),
        }
    }
}

/// `"{field}\n{value}\n"` for each present signed field, in canonical order
pub fn canonical_string(envelope: &WebhookEnvelope) -> String {
    envelope
        .signing_fields()
        .iter()
        .filter_map(|(field, value)| value.map(|value| format!("{}\n{}\n", field, value)))
        .collect()
}

/// Check `signature` over `canonical` with `key`
pub fn verify_with_key(
    key: &RsaPublicKey,
    version: SignatureVersion,
    canonical: &str,
    signature: &[u8],
) -> Result<(), WebhookError> {
    let result = match version {
        SignatureVersion::Sha1 => {
            let digest = Sha1::digest(canonical.as_bytes());
            key.verify(Pkcs1v15Sign::new::<Sha1>(), &digest, signature)
        }
        SignatureVersion::Sha256 => {
            let digest = Sha256::digest(canonical.as_bytes());
            key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        }
    };
    result.map_err(|_| WebhookError::Authentication("signature mismatch".to_string()))
}

/// Verifies envelopes against their signing certificate
pub struct SignatureVerifier {
    fetcher: Arc<dyn CertificateFetcher>,
    config: WebhookConfig,
}

impl SignatureVerifier {
    pub fn new(fetcher: Arc<dyn CertificateFetcher>, config: WebhookConfig) -> Self {
        Self { fetcher, config }
    }

    /// True only when the envelope is authentic; every failure is a rejection
    pub async fn verify(&self, envelope: &WebhookEnvelope) -> bool {
        match self.authenticate(envelope).await {
            Ok(()) => {
                info!("Verified message {}", envelope.message_id);
                true
            }
            Err(e) => {
                warn!("Rejected message {}: {}", envelope.message_id, e);
                false
            }
        }
    }

    /// Like [`verify`](Self::verify) but reports why an envelope was rejected
    pub async fn authenticate(&self, envelope: &WebhookEnvelope) -> Result<(), WebhookError> {
        let version = SignatureVersion::of(envelope)?;
        self.check_certificate_url(&envelope.signing_cert_url)?;

        let signature = STANDARD
            .decode(envelope.signature.trim())
            .map_err(|e| WebhookError::Authentication(format!("invalid signature encoding: {}", e)))?;

        let pem = tokio::time::timeout(
            self.config.certificate_timeout(),
            self.fetcher.fetch(&envelope.signing_cert_url),
        )
        .await
        .map_err(|_| {
            WebhookError::Authentication(format!(
                "certificate fetch timed out after {}s",
                self.config.certificate_timeout_secs
            ))
        })??;

        let key = public_key_from_pem(&pem)?;
        debug!("Loaded signing key from {}", envelope.signing_cert_url);

        verify_with_key(&key, version, &canonical_string(envelope), &signature)
    }

    fn check_certificate_url(&self, raw: &str) -> Result<(), WebhookError> {
        let url = Url::parse(raw)
            .map_err(|e| WebhookError::Authentication(format!("invalid certificate URL: {}", e)))?;

        if self.config.require_https_certificate && url.scheme() != "https" {
            return Err(WebhookError::Authentication(format!(
                "certificate URL is not https: {}",
                raw
            )));
        }

        if self.config.allowed_certificate_hosts.is_empty() {
            return Ok(());
        }

        let host = url.host_str().unwrap_or_default();
        let allowed = self.config.allowed_certificate_hosts.iter().any(|allowed| {
            host == allowed || host.ends_with(&format!(".{}", allowed))
        });
        if allowed {
            Ok(())
        } else {
            Err(WebhookError::Authentication(format!(
                "certificate host not allowed: {}",
                host
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CERTIFICATE: &str = include_str!("../fixtures/signing-cert.pem");
    const NOTIFICATION: &str = include_str!("../fixtures/notification.json");
    const NOTIFICATION_V2: &str = include_str!("../fixtures/notification-v2.json");
    const CONFIRMATION: &str = include_str!("../fixtures/subscription-confirmation.json");

    struct StaticFetcher {
        pem: Option<&'static str>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn serving(pem: &'static str) -> Self {
            Self {
                pem: Some(pem),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl CertificateFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, WebhookError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.pem
                .map(str::to_string)
                .ok_or_else(|| WebhookError::Authentication("connection refused".to_string()))
        }
    }

    fn verifier(fetcher: StaticFetcher) -> SignatureVerifier {
        SignatureVerifier::new(Arc::new(fetcher), WebhookConfig::default())
    }

    fn envelope(raw: &str) -> WebhookEnvelope {
        WebhookEnvelope::from_slice(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_canonical_string_order() {
        let env = envelope(CONFIRMATION);
        let canonical = canonical_string(&env);

        let positions: Vec<usize> = ["Message\n", "MessageId\n", "SubscribeURL\n", "Timestamp\n", "Token\n", "TopicArn\n", "Type\n"]
            .iter()
            .map(|field| canonical.find(field).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(canonical.starts_with("Message\nYou have chosen"));
        assert!(canonical.ends_with("Type\nSubscriptionConfirmation\n"));
    }

    #[test]
    fn test_canonical_string_omits_absent_fields() {
        let mut env = envelope(NOTIFICATION);
        env.subject = None;
        let canonical = canonical_string(&env);

        assert!(!canonical.contains("Subject\n"));
        assert!(!canonical.contains("Token\n"));
        assert!(!canonical.contains("SubscribeURL\n"));
        assert_eq!(
            canonical,
            format!(
                "Message\n{}\nMessageId\n{}\nTimestamp\n{}\nTopicArn\n{}\nType\nNotification\n",
                env.message,
                env.message_id,
                env.timestamp,
                env.topic_arn.as_deref().unwrap()
            )
        );
    }

    #[tokio::test]
    async fn test_valid_envelopes_verify() {
        let verifier = verifier(StaticFetcher::serving(CERTIFICATE));
        assert!(verifier.verify(&envelope(NOTIFICATION)).await);
        assert!(verifier.verify(&envelope(NOTIFICATION_V2)).await);
        assert!(verifier.verify(&envelope(CONFIRMATION)).await);
    }

    #[tokio::test]
    async fn test_any_message_byte_change_fails() {
        let verifier = verifier(StaticFetcher::serving(CERTIFICATE));
        let original = envelope(NOTIFICATION);

        for index in [0, original.message.len() / 2, original.message.len() - 1] {
            let mut tampered = original.clone();
            let mut bytes = tampered.message.into_bytes();
            bytes[index] ^= 0x01;
            tampered.message = String::from_utf8(bytes).unwrap();
            assert!(!verifier.verify(&tampered).await, "byte {} flipped", index);
        }
    }

    #[tokio::test]
    async fn test_removed_subject_fails() {
        let verifier = verifier(StaticFetcher::serving(CERTIFICATE));
        let mut env = envelope(NOTIFICATION);
        env.subject = None;
        assert!(!verifier.verify(&env).await);
    }

    #[tokio::test]
    async fn test_version_mismatch_fails() {
        let verifier = verifier(StaticFetcher::serving(CERTIFICATE));
        let mut env = envelope(NOTIFICATION_V2);
        env.signature_version = Some("1".to_string());
        assert!(!verifier.verify(&env).await);

        env.signature_version = Some("3".to_string());
        assert!(!verifier.verify(&env).await);
    }

    #[tokio::test]
    async fn test_unreachable_certificate_fails() {
        let fetcher = StaticFetcher {
            pem: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        };
        assert!(!verifier(fetcher).verify(&envelope(NOTIFICATION)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_certificate_times_out() {
        let fetcher = StaticFetcher {
            pem: Some(CERTIFICATE),
            delay: Duration::from_secs(60),
            calls: AtomicUsize::new(0),
        };
        let result = verifier(fetcher).authenticate(&envelope(NOTIFICATION)).await;
        assert!(matches!(result, Err(WebhookError::Authentication(msg)) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_certificate_host_is_checked_before_fetch() {
        let fetcher = Arc::new(StaticFetcher::serving(CERTIFICATE));
        let verifier = SignatureVerifier::new(fetcher.clone(), WebhookConfig::default());

        let mut env = envelope(NOTIFICATION);
        env.signing_cert_url = "https://attacker.example.com/cert.pem".to_string();
        assert!(!verifier.verify(&env).await);

        env.signing_cert_url = "http://sns.ap-northeast-1.amazonaws.com/cert.pem".to_string();
        assert!(!verifier.verify(&env).await);

        env.signing_cert_url = "https://evilamazonaws.com/cert.pem".to_string();
        assert!(!verifier.verify(&env).await);

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_certificate_fails() {
        let other = "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIUEbX5\n-----END CERTIFICATE-----\n";
        let verifier = verifier(StaticFetcher::serving(other));
        assert!(!verifier.verify(&envelope(NOTIFICATION)).await);
    }
}
