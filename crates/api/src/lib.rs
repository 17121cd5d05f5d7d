//! Alarm Relay API Server
//!
//! Receives push notifications from the alerting channel, authenticates
//! them and fans authenticated alarms out to the owning tenant's
//! notification destinations.
//!
//! `POST /api/v1/notify` answers with:
//!
//! - `200` for accepted notifications, confirmed subscriptions, unsubscribe
//!   confirmations and unknown message types
//! - `400` for malformed or unauthenticated payloads and failed subscription
//!   confirmations
//! - `404` when no live account owns the alarm
//! - `500` only when the notification topology itself cannot be read; a
//!   failing mail or voice provider is reported per destination inside a
//!   `200` response

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
mod error;
pub mod rate_limit;
mod routes;
pub mod topology;

pub use config::AppConfig;
pub use error::ApiError;

use anyhow::Context;
use notify::{
    DestinationChannels, FanoutDispatcher, HttpVoiceCaller, MailSender, SmtpMailSender,
    VoiceCaller,
};
use storage::Repository;
use webhook::{
    AlertMessageParser, CertificateFetcher, HttpCertificateFetcher, HttpSubscriptionConfirmer,
    SignatureVerifier, SubscriptionConfirmer,
};

/// External services the relay talks to
pub struct Collaborators {
    pub certificates: Arc<dyn CertificateFetcher>,
    pub confirmer: Arc<dyn SubscriptionConfirmer>,
    pub mail: Arc<dyn MailSender>,
    pub voice: Arc<dyn VoiceCaller>,
}

impl Collaborators {
    /// HTTP, SMTP and voice API clients built from the configuration
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let timeout = config.webhook.certificate_timeout();
        Ok(Self {
            certificates: Arc::new(HttpCertificateFetcher::new(timeout).context("certificate fetcher")?),
            confirmer: Arc::new(HttpSubscriptionConfirmer::new(timeout).context("subscription confirmer")?),
            mail: Arc::new(SmtpMailSender::new(&config.notify).context("mail sender")?),
            voice: Arc::new(HttpVoiceCaller::new(&config.notify).context("voice caller")?),
        })
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub repository: Arc<Repository>,
    pub verifier: SignatureVerifier,
    pub parser: AlertMessageParser,
    pub confirmer: Arc<dyn SubscriptionConfirmer>,
    pub dispatcher: FanoutDispatcher,
    /// Renders `/metrics`; absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: &AppConfig, repository: Arc<Repository>, collaborators: Collaborators) -> Self {
        let channels = DestinationChannels::new(
            collaborators.mail,
            collaborators.voice,
            config.notify.clone(),
        );

        Self {
            verifier: SignatureVerifier::new(collaborators.certificates, config.webhook.clone()),
            parser: AlertMessageParser::new(config.alert.clone(), repository.clone()),
            confirmer: collaborators.confirmer,
            dispatcher: FanoutDispatcher::new(repository.clone(), channels),
            repository,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub topology: TopologySummary,
}

/// Live topology counts
#[derive(Debug, Serialize)]
pub struct TopologySummary {
    pub group_count: usize,
    pub destination_count: usize,
}

/// Create the application router
pub fn create_router(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/notify", post(routes::notify::receive))
        .route("/metrics", get(routes::metrics::render))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        topology: TopologySummary {
            group_count: state.repository.group_count(),
            destination_count: state.repository.destination_count(),
        },
    })
}

/// Initialize logging
pub fn init_logging(log_level: &str) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Run the server
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = PrometheusBuilder::new().install_recorder()?;

    let repository = Arc::new(Repository::new());
    topology::seed(&repository, &config.topology)?;

    let collaborators = Collaborators::from_config(&config)?;
    let state = AppState::new(&config, repository, collaborators).with_metrics(metrics);
    let governor = rate_limit::create_governor_config(&config.server.rate_limit)
        .ok_or("rate limit settings must be non-zero")?;

    let app = create_router(Arc::new(RwLock::new(state))).layer(GovernorLayer { config: governor });

    info!("Starting API server on {}", config.server.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
