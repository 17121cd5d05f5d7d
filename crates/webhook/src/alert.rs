//! Alert Message Parsing
//!
//! Turns the nested alarm payload of an authenticated `Notification` into an
//! [`AlertMessage`] bound to the owning tenant account.

use chrono::{DateTime, FixedOffset};
use monitoring::{Resource, ServiceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use storage::{AwsEnvironment, Repository, StorageError};
use tracing::{debug, warn};

use crate::envelope::WebhookEnvelope;
use crate::WebhookError;

const STATE_CHANGE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";
const FIRING_STATE: &str = "ALARM";

/// Alert rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Hours added to UTC for displayed timestamps
    pub display_offset_hours: i32,
    /// chrono format of the displayed timestamp
    pub time_format: String,
    /// Level code to display label
    pub level_labels: BTreeMap<String, String>,
    /// Label used when the alarm left the firing state
    pub recovery_label: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        let level_labels = [("CAUTION", "警告"), ("DANGER", "危険")]
            .into_iter()
            .map(|(code, label)| (code.to_string(), label.to_string()))
            .collect();

        Self {
            display_offset_hours: 9,
            time_format: "%Y年%m月%d日 %H時%M分%S秒".to_string(),
            level_labels,
            recovery_label: "正常".to_string(),
        }
    }
}

/// Alarm state change ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertMessage {
    pub alarm_name: String,
    pub resource: Resource,
    pub metric: String,
    /// Display label of the level, or the recovery label
    pub level: String,
    /// Whether the alarm is firing (false for recovery transitions)
    pub firing: bool,
    /// `occurred_at` rendered with the configured format
    pub time: String,
    pub occurred_at: DateTime<FixedOffset>,
    pub aws_account: AwsEnvironment,
}

impl AlertMessage {
    pub fn region_display_name(&self) -> &str {
        self.resource.region_display_name()
    }

    pub fn metric_display_name(&self) -> String {
        self.resource.metric_display_name(&self.metric)
    }
}

/// Lookup of the tenant account owning an external account id
pub trait AccountResolver: Send + Sync {
    fn by_external_id(&self, aws_account_id: &str) -> Result<AwsEnvironment, WebhookError>;
}

impl AccountResolver for Repository {
    fn by_external_id(&self, aws_account_id: &str) -> Result<AwsEnvironment, WebhookError> {
        self.account_by_external_id(aws_account_id).map_err(|e| match e {
            StorageError::NotFound(_) => WebhookError::AccountNotFound(aws_account_id.to_string()),
            other => WebhookError::AccountNotFound(format!("{} ({})", aws_account_id, other)),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AlarmNotification {
    alarm_name: String,
    #[serde(rename = "AWSAccountId")]
    aws_account_id: String,
    new_state_value: String,
    state_change_time: String,
    region: String,
    trigger: Trigger,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Trigger {
    metric_name: String,
    namespace: String,
    #[serde(default)]
    dimensions: Vec<TriggerDimension>,
}

#[derive(Debug, Deserialize)]
struct TriggerDimension {
    value: String,
}

pub struct AlertMessageParser {
    config: AlertConfig,
    accounts: Arc<dyn AccountResolver>,
}

impl AlertMessageParser {
    pub fn new(config: AlertConfig, accounts: Arc<dyn AccountResolver>) -> Self {
        Self { config, accounts }
    }

    pub fn parse(&self, envelope: &WebhookEnvelope) -> Result<AlertMessage, WebhookError> {
        let alarm: AlarmNotification = serde_json::from_str(&envelope.message)?;

        let service = ServiceKind::from_namespace(&alarm.trigger.namespace)
            .map_err(|e| WebhookError::Malformed(e.to_string()))?;
        let resource_id = alarm
            .trigger
            .dimensions
            .first()
            .map(|d| d.value.clone())
            .ok_or_else(|| WebhookError::Malformed("alarm trigger has no dimensions".to_string()))?;

        let occurred_at = self.display_time(&alarm.state_change_time)?;
        let firing = alarm.new_state_value == FIRING_STATE;
        let level = self.level_label(&alarm.alarm_name, firing);

        let aws_account = self.accounts.by_external_id(&alarm.aws_account_id)?;
        debug!(
            "Parsed alarm {} for account {} ({})",
            alarm.alarm_name, aws_account.id, aws_account.name
        );

        Ok(AlertMessage {
            resource: Resource::new(alarm.region, service, resource_id),
            metric: alarm.trigger.metric_name,
            level,
            firing,
            time: occurred_at.format(&self.config.time_format).to_string(),
            occurred_at,
            aws_account,
            alarm_name: alarm.alarm_name,
        })
    }

    fn display_time(&self, raw: &str) -> Result<DateTime<FixedOffset>, WebhookError> {
        let changed = DateTime::parse_from_str(raw, STATE_CHANGE_TIME_FORMAT)
            .map_err(|e| WebhookError::Malformed(format!("StateChangeTime {}: {}", raw, e)))?;
        let offset = FixedOffset::east_opt(self.config.display_offset_hours * 3600).ok_or_else(|| {
            WebhookError::Malformed(format!(
                "display offset out of range: {}h",
                self.config.display_offset_hours
            ))
        })?;
        Ok(changed.with_timezone(&offset))
    }

    fn level_label(&self, alarm_name: &str, firing: bool) -> String {
        if !firing {
            return self.config.recovery_label.clone();
        }

        let code = alarm_name.rsplit('-').next().unwrap_or(alarm_name);
        let label = self
            .config
            .level_labels
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(code))
            .map(|(_, label)| label);
        match label {
            Some(label) => label.clone(),
            None => {
                warn!("No label for level code {} in alarm {}", code, alarm_name);
                code.to_string()
            }
        }
    }
}
