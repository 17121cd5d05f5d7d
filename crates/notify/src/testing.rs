//! Test doubles for the delivery channels

use async_trait::async_trait;
use chrono::DateTime;
use monitoring::{Resource, ServiceKind};
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::time::Duration;
use storage::{AwsEnvironment, Lifecycle};
use webhook::AlertMessage;

use crate::channels::{MailSender, VoiceAttributes, VoiceCaller};
use crate::ChannelError;

pub fn alert_message() -> AlertMessage {
    AlertMessage {
        alarm_name: "MONITOR-EC2-i-0123456789abcdef0-CPUUtilization-DANGER".to_string(),
        resource: Resource::new("Asia Pacific (Tokyo)", ServiceKind::Ec2, "i-0123456789abcdef0"),
        metric: "CPUUtilization".to_string(),
        level: "危険".to_string(),
        firing: true,
        time: "2019年03月05日 11時11分40秒".to_string(),
        occurred_at: DateTime::parse_from_rfc3339("2019-03-05T11:11:40.432+09:00").unwrap(),
        aws_account: AwsEnvironment {
            id: 1,
            name: "production".to_string(),
            aws_account_id: "123456789012".to_string(),
            tenant_id: 1,
            lifecycle: Lifecycle::Active,
        },
    }
}

/// Records sent mails; addresses in `failing` get a provider error
#[derive(Default)]
pub struct RecordingMail {
    failing: BTreeSet<String>,
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingMail {
    pub fn failing(addresses: &[&str]) -> Self {
        Self {
            failing: addresses.iter().map(|a| a.to_string()).collect(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// (address, subject, body) of every accepted mail
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMail {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<(), ChannelError> {
        if self.failing.contains(address) {
            return Err(ChannelError::Provider("mailbox unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingVoice {
    delay: Duration,
    calls: Mutex<Vec<(String, VoiceAttributes)>>,
}

impl RecordingVoice {
    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, VoiceAttributes)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VoiceCaller for RecordingVoice {
    async fn call(&self, e164_number: &str, attributes: &VoiceAttributes) -> Result<(), ChannelError> {
        tokio::time::sleep(self.delay).await;
        self.calls
            .lock()
            .unwrap()
            .push((e164_number.to_string(), attributes.clone()));
        Ok(())
    }
}
