//! Topic Subscription Confirmation

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

use crate::envelope::WebhookEnvelope;
use crate::WebhookError;

/// Fields needed to confirm a pending topic subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub topic_arn: String,
    pub token: String,
    /// Confirmation link sent with the request, when present
    pub subscribe_url: Option<String>,
}

impl SubscriptionRequest {
    pub fn from_envelope(envelope: &WebhookEnvelope) -> Result<Self, WebhookError> {
        let required = |field: &str, value: &Option<String>| {
            value
                .clone()
                .ok_or_else(|| WebhookError::Malformed(format!("{} is required for subscription confirmation", field)))
        };

        Ok(Self {
            topic_arn: required("TopicArn", &envelope.topic_arn)?,
            token: required("Token", &envelope.token)?,
            subscribe_url: envelope.subscribe_url.clone(),
        })
    }

    /// URL that confirms the subscription
    ///
    /// Without a `SubscribeURL` the `ConfirmSubscription` action is addressed
    /// to the regional endpoint named by the topic ARN
    /// (`arn:aws:sns:{region}:{account}:{topic}`).
    pub fn confirmation_url(&self) -> Result<reqwest::Url, WebhookError> {
        if let Some(url) = &self.subscribe_url {
            return reqwest::Url::parse(url)
                .map_err(|e| WebhookError::Malformed(format!("SubscribeURL {}: {}", url, e)));
        }

        let region = match self.topic_arn.split(':').collect::<Vec<_>>().as_slice() {
            ["arn", _, "sns", region, _, _] if !region.is_empty() => *region,
            _ => {
                return Err(WebhookError::Malformed(format!(
                    "TopicArn {} does not name a region",
                    self.topic_arn
                )))
            }
        };

        reqwest::Url::parse_with_params(
            &format!("https://sns.{}.amazonaws.com/", region),
            &[
                ("Action", "ConfirmSubscription"),
                ("TopicArn", self.topic_arn.as_str()),
                ("Token", self.token.as_str()),
            ],
        )
        .map_err(|e| WebhookError::Malformed(format!("confirmation URL for {}: {}", self.topic_arn, e)))
    }
}

#[async_trait]
pub trait SubscriptionConfirmer: Send + Sync {
    async fn confirm(&self, request: &SubscriptionRequest) -> Result<(), WebhookError>;
}

/// Confirms by visiting the request's confirmation URL
pub struct HttpSubscriptionConfirmer {
    client: reqwest::Client,
}

impl HttpSubscriptionConfirmer {
    pub fn new(timeout: Duration) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WebhookError::Subscription(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SubscriptionConfirmer for HttpSubscriptionConfirmer {
    async fn confirm(&self, request: &SubscriptionRequest) -> Result<(), WebhookError> {
        let url = request.confirmation_url()?;
        self.client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WebhookError::Subscription(format!("{}: {}", request.topic_arn, e)))?;

        info!("Confirmed subscription to {}", request.topic_arn);
        Ok(())
    }
}
