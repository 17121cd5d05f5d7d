//! Webhook Error Types

use thiserror::Error;

/// Errors raised while authenticating or interpreting an inbound notification
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Unparseable JSON or a missing required field
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Certificate unreachable or invalid, or signature mismatch
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No live account matches the alarm's external account id
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Subscription confirmation call failed
    #[error("Subscription confirmation failed: {0}")]
    Subscription(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::Malformed(err.to_string())
    }
}
