//! Per-Destination Delivery
//!
//! Each destination kind decides how an alert or a schedule result reaches
//! it. Provider failures become [`DeliveryOutcome::Failed`] values; nothing
//! here returns an error.

use serde::Serialize;
use std::sync::Arc;
use storage::{DestinationKind, NotificationDestination, RecordId};
use tracing::debug;
use webhook::AlertMessage;

use crate::channels::{MailSender, VoiceAttributes, VoiceCaller};
use crate::phone::to_e164;
use crate::{ChannelError, NotifyConfig};

/// A scheduled action whose result is reported to the account's groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub id: RecordId,
    pub name: String,
    pub aws_environment_id: RecordId,
}

/// Result of one destination's delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
    /// The destination kind does not take this kind of notification
    Skipped,
}

impl DeliveryOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Failed(_) => "failed",
            DeliveryOutcome::Skipped => "skipped",
        }
    }
}

/// What is being delivered
#[derive(Debug, Clone, Copy)]
pub enum Delivery<'a> {
    Alert(&'a AlertMessage),
    ScheduleResult { schedule: &'a Schedule, succeeded: bool },
}

/// Mail and voice channels shared by every destination
pub struct DestinationChannels {
    mail: Arc<dyn MailSender>,
    voice: Arc<dyn VoiceCaller>,
    config: NotifyConfig,
}

impl DestinationChannels {
    pub fn new(mail: Arc<dyn MailSender>, voice: Arc<dyn VoiceCaller>, config: NotifyConfig) -> Self {
        Self { mail, voice, config }
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    pub async fn deliver(&self, destination: &NotificationDestination, delivery: Delivery<'_>) -> DeliveryOutcome {
        match delivery {
            Delivery::Alert(message) => self.notify(destination, message).await,
            Delivery::ScheduleResult { schedule, succeeded } => {
                self.result_schedule(destination, schedule, succeeded).await
            }
        }
    }

    /// Deliver an alert to one destination
    pub async fn notify(&self, destination: &NotificationDestination, message: &AlertMessage) -> DeliveryOutcome {
        match &destination.kind {
            DestinationKind::Email { address } => {
                let body = self.config.render_alert(message);
                let result = self.mail.send(address, &self.config.mail_subject, &body).await;
                email_outcome(result)
            }
            DestinationKind::Telephone {
                phone_number,
                country_code,
            } => {
                let result = self.call(phone_number, country_code, message).await;
                telephone_outcome(destination.id, result)
            }
        }
    }

    /// Report a schedule result to one destination; voice destinations never take these
    pub async fn result_schedule(
        &self,
        destination: &NotificationDestination,
        schedule: &Schedule,
        succeeded: bool,
    ) -> DeliveryOutcome {
        match &destination.kind {
            DestinationKind::Email { address } => {
                let subject = self.config.schedule_subject(schedule);
                let body = self.config.schedule_body(schedule, succeeded);
                email_outcome(self.mail.send(address, &subject, &body).await)
            }
            DestinationKind::Telephone { .. } => {
                debug!("Skipping schedule result for telephone destination {}", destination.id);
                DeliveryOutcome::Skipped
            }
        }
    }

    async fn call(&self, phone_number: &str, country_code: &str, message: &AlertMessage) -> Result<(), ChannelError> {
        let number = to_e164(phone_number, country_code)?;
        let attributes = VoiceAttributes::call(self.config.render_alert(message), self.config.voice_loop_count);
        self.voice.call(&number, &attributes).await
    }
}

fn email_outcome(result: Result<(), ChannelError>) -> DeliveryOutcome {
    match result {
        Ok(()) => DeliveryOutcome::Delivered,
        Err(e) => DeliveryOutcome::Failed(e.to_string()),
    }
}

fn telephone_outcome(destination_id: RecordId, result: Result<(), ChannelError>) -> DeliveryOutcome {
    match result {
        Ok(()) => DeliveryOutcome::Delivered,
        Err(e) => DeliveryOutcome::Failed(format!("telephone destination {}: {}", destination_id, e)),
    }
}
