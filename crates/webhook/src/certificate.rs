//! Signing Certificate Retrieval and Key Extraction

use async_trait::async_trait;
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use std::time::Duration;
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

use crate::WebhookError;

/// Retrieves the PEM signing certificate named by an envelope
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, WebhookError>;
}

/// Fetches certificates over HTTP(S)
pub struct HttpCertificateFetcher {
    client: reqwest::Client,
}

impl HttpCertificateFetcher {
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WebhookError::Authentication(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CertificateFetcher for HttpCertificateFetcher {
    async fn fetch(&self, url: &str) -> Result<String, WebhookError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WebhookError::Authentication(format!("certificate fetch failed: {}", e)))?;

        response
            .text()
            .await
            .map_err(|e| WebhookError::Authentication(format!("certificate read failed: {}", e)))
    }
}

/// RSA public key of the first certificate in a PEM document
pub fn public_key_from_pem(pem: &str) -> Result<RsaPublicKey, WebhookError> {
    let mut reader = pem.as_bytes();
    let der = rustls_pemfile::certs(&mut reader)
        .next()
        .ok_or_else(|| WebhookError::Authentication("no certificate in PEM".to_string()))?
        .map_err(|e| WebhookError::Authentication(format!("invalid PEM: {}", e)))?;

    let certificate = Certificate::from_der(der.as_ref())
        .map_err(|e| WebhookError::Authentication(format!("invalid certificate: {}", e)))?;

    let spki = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| WebhookError::Authentication(format!("invalid public key info: {}", e)))?;

    RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| WebhookError::Authentication(format!("not an RSA key: {}", e)))
}
