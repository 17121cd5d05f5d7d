//! Prometheus Metrics Route

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::AppState;

/// Render the installed recorder in the Prometheus text format
pub async fn render(State(state): State<Arc<RwLock<AppState>>>) -> (StatusCode, String) {
    let state = state.read().await;
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed\n".to_string()),
    }
}
