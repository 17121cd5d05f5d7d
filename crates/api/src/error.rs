//! HTTP Error Mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notify::NotifyError;
use serde_json::json;
use thiserror::Error;
use webhook::WebhookError;

/// Failure of one webhook request
///
/// `Notify` is an unreadable topology store, not a delivery failure, and is the
/// only variant mapped outside the 400/404 range.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Webhook(WebhookError::AccountNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Webhook(_) => StatusCode::BAD_REQUEST,
            ApiError::Notify(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
