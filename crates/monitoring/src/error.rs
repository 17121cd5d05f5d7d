//! Monitoring Error Types

use thiserror::Error;

/// Errors raised while classifying alarms or talking to the alerting channel
#[derive(Debug, Error)]
pub enum MonitoringError {
    /// Alarm name does not end in a level suffix
    #[error("Invalid alarm name: {0}")]
    InvalidAlarmName(String),

    #[error("Unknown monitor level: {0}")]
    UnknownLevel(String),

    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// Record lacks the dimension identifying its resource
    #[error("Missing dimension: {0}")]
    MissingDimension(&'static str),

    /// Metric is not monitored for the resource's service
    #[error("Metric {metric} is not monitored for {service}")]
    UnsupportedMetric { service: String, metric: String },

    /// Alerting channel call failed
    #[error("Alerting channel error: {0}")]
    Channel(String),
}
