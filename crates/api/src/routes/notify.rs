//! Push Notification Webhook Route
//!
//! Every request is authenticated before its type is looked at. Authentic
//! notifications are parsed and fanned out; subscription confirmations are
//! confirmed; anything else is acknowledged.

use axum::{body::Bytes, extract::State, Json};
use notify::DestinationResult;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use webhook::{MessageType, SubscriptionRequest, WebhookEnvelope, WebhookError};

use crate::{ApiError, AppState};

/// Response for the notify endpoint
#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    #[serde(rename = "type")]
    pub message_type: String,
    /// Per-destination outcomes; empty unless an alert was dispatched
    pub results: Vec<DestinationResult>,
}

impl NotifyResponse {
    fn acknowledged(message_type: &MessageType) -> Self {
        Self {
            message_type: message_type.to_string(),
            results: Vec::new(),
        }
    }
}

/// Receive one push notification
pub async fn receive(
    State(state): State<Arc<RwLock<AppState>>>,
    body: Bytes,
) -> Result<Json<NotifyResponse>, ApiError> {
    let envelope = match WebhookEnvelope::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Rejected unparseable notification: {}", e);
            let error = ApiError::from(e);
            record_request("unparsed", outcome_label(Some(&error)));
            return Err(error);
        }
    };

    let message_type = envelope.kind();
    let state = state.read().await;
    let result = handle(&state, &envelope, &message_type).await;

    record_request(type_label(&message_type), outcome_label(result.as_ref().err()));
    result.map(Json)
}

async fn handle(
    state: &AppState,
    envelope: &WebhookEnvelope,
    message_type: &MessageType,
) -> Result<NotifyResponse, ApiError> {
    if !state.verifier.verify(envelope).await {
        return Err(WebhookError::Authentication(format!(
            "signature verification failed for message {}",
            envelope.message_id
        ))
        .into());
    }
    info!("Message Type is {}", message_type);

    match message_type {
        MessageType::Notification => {
            let alert = state.parser.parse(envelope)?;
            let results = state.dispatcher.dispatch(&alert).await?;
            Ok(NotifyResponse {
                message_type: message_type.to_string(),
                results,
            })
        }
        MessageType::SubscriptionConfirmation => {
            let request = SubscriptionRequest::from_envelope(envelope)?;
            state.confirmer.confirm(&request).await?;
            Ok(NotifyResponse::acknowledged(message_type))
        }
        MessageType::UnsubscribeConfirmation => {
            info!("Unsubscribe confirmation: {}", envelope.message);
            Ok(NotifyResponse::acknowledged(message_type))
        }
        MessageType::Unknown(raw) => {
            warn!("Unknown message type {} for message {}", raw, envelope.message_id);
            Ok(NotifyResponse::acknowledged(message_type))
        }
    }
}

fn type_label(message_type: &MessageType) -> &'static str {
    match message_type {
        MessageType::Notification => "notification",
        MessageType::SubscriptionConfirmation => "subscription_confirmation",
        MessageType::UnsubscribeConfirmation => "unsubscribe_confirmation",
        MessageType::Unknown(_) => "unknown",
    }
}

fn outcome_label(error: Option<&ApiError>) -> &'static str {
    match error {
        None => "accepted",
        Some(ApiError::Webhook(WebhookError::Malformed(_))) => "malformed",
        Some(ApiError::Webhook(WebhookError::Authentication(_))) => "unauthenticated",
        Some(ApiError::Webhook(WebhookError::AccountNotFound(_))) => "account_not_found",
        Some(ApiError::Webhook(WebhookError::Subscription(_))) => "subscription_failed",
        Some(ApiError::Notify(_)) => "internal_error",
    }
}

fn record_request(message_type: &'static str, outcome: &'static str) {
    metrics::counter!(
        "webhook_requests_total",
        "type" => message_type,
        "outcome" => outcome
    )
    .increment(1);
}
