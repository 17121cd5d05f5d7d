//! Webhook Module
//!
//! Authenticates inbound push notifications, confirms topic subscriptions
//! and parses alarm notifications into alert messages for the tenant
//! account that owns them.

mod alert;
mod certificate;
mod envelope;
mod error;
mod signature;
mod subscription;

pub use alert::{AccountResolver, AlertConfig, AlertMessage, AlertMessageParser};
pub use certificate::{public_key_from_pem, CertificateFetcher, HttpCertificateFetcher};
pub use envelope::{MessageType, WebhookEnvelope};
pub use error::WebhookError;
pub use signature::{canonical_string, SignatureVerifier, SignatureVersion, WebhookConfig};
pub use subscription::{HttpSubscriptionConfirmer, SubscriptionConfirmer, SubscriptionRequest};
