//! Alarm Records and Alerting-Channel Collaborators

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::AlarmDefinition;
use crate::MonitoringError;

/// Alarm state as reported by the alerting channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    Ok,
    Alarm,
    InsufficientData,
}

/// Metric dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Externally reported metric alarm (read-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricAlarmRecord {
    pub alarm_name: String,
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub state_value: AlarmState,
    pub threshold: Option<f64>,
    pub actions_enabled: Option<bool>,
    pub period: Option<u32>,
    pub evaluation_periods: Option<u32>,
    pub statistic: Option<String>,
}

impl MetricAlarmRecord {
    pub fn is_firing(&self) -> bool {
        self.state_value == AlarmState::Alarm
    }

    /// Value of the named dimension
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}

/// One page of an alarm listing
#[derive(Debug, Clone, Default)]
pub struct AlarmPage {
    pub records: Vec<MetricAlarmRecord>,
    pub next_token: Option<String>,
}

/// Paginated alarm listing on the alerting channel
#[async_trait]
pub trait AlarmSource: Send + Sync {
    async fn list_alarms(
        &self,
        name_prefix: &str,
        next_token: Option<&str>,
    ) -> Result<AlarmPage, MonitoringError>;
}

/// Receiver of generated alarm definitions
#[async_trait]
pub trait AlarmSink: Send + Sync {
    async fn put_metric_alarm(&self, definition: &AlarmDefinition) -> Result<(), MonitoringError>;
}
