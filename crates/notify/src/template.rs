//! Notification Configuration and Message Templates

use serde::{Deserialize, Serialize};
use std::time::Duration;
use webhook::AlertMessage;

use crate::Schedule;

/// Region names are rendered with this suffix
const REGION_SUFFIX: &str = "リージョン";

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Upper bound on one destination's delivery (seconds)
    pub dispatch_timeout_secs: u64,
    /// Subject of alert mails
    pub mail_subject: String,
    /// Alert text shared by mail bodies and voice calls
    pub mail_template: String,
    /// Subject prefix of schedule result mails
    pub schedule_subject_prefix: String,
    /// Times the voice message is repeated in one call
    pub voice_loop_count: u32,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub sender_address: String,
    /// Outbound call API endpoint
    pub voice_endpoint: String,
    pub voice_source_number: String,
    pub voice_flow_id: String,
    pub voice_instance_id: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout_secs: 10,
            mail_subject: "【アラート通知】監視アラーム".to_string(),
            mail_template: "{timestamp} に {aws_name}({aws_account_id}) の {region} {service} {resource_id} で {metrics} が {level} になりました。".to_string(),
            schedule_subject_prefix: "【アラート通知】スケジュール実行結果".to_string(),
            voice_loop_count: 3,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            sender_address: "alerts@localhost".to_string(),
            voice_endpoint: "http://localhost:9000/calls".to_string(),
            voice_source_number: String::new(),
            voice_flow_id: String::new(),
            voice_instance_id: String::new(),
        }
    }
}

impl NotifyConfig {
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    /// Alert text with every placeholder substituted
    pub fn render_alert(&self, message: &AlertMessage) -> String {
        let region = format!("{}{}", message.region_display_name(), REGION_SUFFIX);
        let metrics = message.metric_display_name();

        [
            ("{timestamp}", message.time.as_str()),
            ("{aws_name}", message.aws_account.name.as_str()),
            ("{aws_account_id}", message.aws_account.aws_account_id.as_str()),
            ("{region}", region.as_str()),
            ("{service}", message.resource.service.name()),
            ("{resource_id}", message.resource.resource_id.as_str()),
            ("{metrics}", metrics.as_str()),
            ("{level}", message.level.as_str()),
        ]
        .into_iter()
        .fold(self.mail_template.clone(), |text, (placeholder, value)| {
            text.replace(placeholder, value)
        })
    }

    pub fn schedule_subject(&self, schedule: &Schedule) -> String {
        format!("{} {}", self.schedule_subject_prefix, schedule.name)
    }

    pub fn schedule_body(&self, schedule: &Schedule, succeeded: bool) -> String {
        let outcome = if succeeded { "成功" } else { "失敗" };
        format!("スケジュール {} の実行に{}しました。", schedule.name, outcome)
    }
}
