//! Notification Fan-out
//!
//! One pass walks every live group of an account and every live destination
//! of each group, in id order. Destinations are attempted one at a time and
//! independently: a failed or slow destination is recorded and the pass
//! moves on.

use serde::Serialize;
use std::sync::Arc;
use storage::{NotificationDestination, RecordId};
use tracing::{debug, info, warn};
use webhook::AlertMessage;

use crate::destination::{Delivery, DeliveryOutcome, DestinationChannels, Schedule};
use crate::topology::NotificationTopology;
use crate::{ChannelError, NotifyError};

/// Outcome of one destination within a fan-out pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationResult {
    pub group_id: RecordId,
    pub destination_id: RecordId,
    pub channel: &'static str,
    pub outcome: DeliveryOutcome,
}

pub struct FanoutDispatcher {
    topology: Arc<dyn NotificationTopology>,
    channels: DestinationChannels,
}

impl FanoutDispatcher {
    pub fn new(topology: Arc<dyn NotificationTopology>, channels: DestinationChannels) -> Self {
        Self { topology, channels }
    }

    /// Deliver an alert to every live destination of its account
    pub async fn dispatch(&self, message: &AlertMessage) -> Result<Vec<DestinationResult>, NotifyError> {
        info!(
            "Dispatching {} for {} {} (account {})",
            message.alarm_name,
            message.resource.service,
            message.resource.resource_id,
            message.aws_account.id
        );
        self.fan_out(message.aws_account.id, Delivery::Alert(message)).await
    }

    /// Report a schedule result to every live destination of its account
    pub async fn dispatch_schedule_result(
        &self,
        schedule: &Schedule,
        succeeded: bool,
    ) -> Result<Vec<DestinationResult>, NotifyError> {
        info!(
            "Dispatching schedule {} result (succeeded: {})",
            schedule.name, succeeded
        );
        self.fan_out(
            schedule.aws_environment_id,
            Delivery::ScheduleResult { schedule, succeeded },
        )
        .await
    }

    async fn fan_out(
        &self,
        aws_environment_id: RecordId,
        delivery: Delivery<'_>,
    ) -> Result<Vec<DestinationResult>, NotifyError> {
        let groups = self.topology.groups_for(aws_environment_id)?;
        let mut results = Vec::new();

        for group in &groups {
            let destinations = match self.topology.destinations_for(group) {
                Ok(destinations) => destinations,
                Err(e) => {
                    warn!("Skipping group {}: {}", group.id, e);
                    continue;
                }
            };
            debug!("Group {} has {} live destinations", group.id, destinations.len());

            for destination in &destinations {
                let outcome = self.deliver_bounded(destination, delivery).await;
                record(group.id, destination, &outcome);
                results.push(DestinationResult {
                    group_id: group.id,
                    destination_id: destination.id,
                    channel: destination.kind.channel(),
                    outcome,
                });
            }
        }

        info!(
            "Fan-out finished: {} groups, {} destinations",
            groups.len(),
            results.len()
        );
        Ok(results)
    }

    async fn deliver_bounded(&self, destination: &NotificationDestination, delivery: Delivery<'_>) -> DeliveryOutcome {
        let timeout = self.channels.config().dispatch_timeout();
        match tokio::time::timeout(timeout, self.channels.deliver(destination, delivery)).await {
            Ok(outcome) => outcome,
            Err(_) => DeliveryOutcome::Failed(format!(
                "{} destination {}: {}",
                destination.kind.channel(),
                destination.id,
                ChannelError::Timeout(timeout.as_secs())
            )),
        }
    }
}

fn record(group_id: RecordId, destination: &NotificationDestination, outcome: &DeliveryOutcome) {
    let channel = destination.kind.channel();
    metrics::counter!(
        "notification_deliveries_total",
        "channel" => channel,
        "outcome" => outcome.label()
    )
    .increment(1);

    match outcome {
        DeliveryOutcome::Failed(reason) => warn!(
            "Delivery to {} destination {} (group {}) failed: {}",
            channel, destination.id, group_id, reason
        ),
        _ => info!(
            "Delivery to {} destination {} (group {}): {}",
            channel,
            destination.id,
            group_id,
            outcome.label()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{alert_message, RecordingMail, RecordingVoice};
    use crate::NotifyConfig;
    use std::time::Duration;
    use storage::{AwsEnvironment, DestinationKind, Repository};

    struct Fixture {
        repo: Arc<Repository>,
        account: AwsEnvironment,
        tenant_id: RecordId,
    }

    impl Fixture {
        fn new() -> Self {
            let repo = Repository::new();
            let tenant = repo.create_tenant("Acme").unwrap();
            let account = repo
                .create_aws_environment(tenant.id, "production", "123456789012")
                .unwrap();
            Self {
                repo: Arc::new(repo),
                account,
                tenant_id: tenant.id,
            }
        }

        fn email(&self, address: &str) -> RecordId {
            self.repo
                .create_destination(
                    self.tenant_id,
                    address,
                    DestinationKind::Email {
                        address: address.to_string(),
                    },
                )
                .unwrap()
                .id
        }

        fn telephone(&self, number: &str) -> RecordId {
            self.repo
                .create_destination(
                    self.tenant_id,
                    number,
                    DestinationKind::Telephone {
                        phone_number: number.to_string(),
                        country_code: "JP".to_string(),
                    },
                )
                .unwrap()
                .id
        }

        fn group(&self, destinations: &[RecordId]) -> RecordId {
            self.repo
                .create_group(
                    self.tenant_id,
                    "on-call",
                    destinations,
                    &[self.account.id],
                )
                .unwrap()
                .id
        }

        fn message(&self) -> AlertMessage {
            let mut message = alert_message();
            message.aws_account = self.account.clone();
            message
        }

        fn dispatcher(&self, mail: Arc<RecordingMail>, voice: Arc<RecordingVoice>) -> FanoutDispatcher {
            let channels = DestinationChannels::new(mail, voice, NotifyConfig::default());
            FanoutDispatcher::new(self.repo.clone(), channels)
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_fan_out() {
        let fixture = Fixture::new();
        let e1 = fixture.email("e1@example.com");
        let e2 = fixture.email("e2@example.com");
        let group = fixture.group(&[e1, e2]);

        let mail = Arc::new(RecordingMail::failing(&["e1@example.com"]));
        let voice = Arc::new(RecordingVoice::default());
        let results = fixture
            .dispatcher(mail.clone(), voice)
            .dispatch(&fixture.message())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].destination_id, e1);
        assert!(matches!(results[0].outcome, DeliveryOutcome::Failed(_)));
        assert_eq!(results[1].destination_id, e2);
        assert_eq!(results[1].outcome, DeliveryOutcome::Delivered);
        assert!(results.iter().all(|r| r.group_id == group));
        assert_eq!(mail.sent().len(), 1);
        assert_eq!(mail.sent()[0].0, "e2@example.com");
    }

    #[tokio::test]
    async fn test_every_group_is_visited() {
        let fixture = Fixture::new();
        let email = fixture.email("ops@example.com");
        let phone = fixture.telephone("090-1234-5678");
        fixture.group(&[email]);
        fixture.group(&[phone, email]);

        let mail = Arc::new(RecordingMail::default());
        let voice = Arc::new(RecordingVoice::default());
        let results = fixture
            .dispatcher(mail.clone(), voice.clone())
            .dispatch(&fixture.message())
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(mail.sent().len(), 2);
        assert_eq!(voice.calls().len(), 1);
        assert!(results.iter().all(|r| r.outcome == DeliveryOutcome::Delivered));
    }

    #[tokio::test]
    async fn test_archived_rows_are_not_notified() {
        let fixture = Fixture::new();
        let kept = fixture.email("kept@example.com");
        let archived = fixture.email("archived@example.com");
        fixture.group(&[kept, archived]);
        let archived_group = fixture.group(&[kept]);
        fixture.repo.archive_destination(archived).unwrap();
        fixture.repo.archive_group(archived_group).unwrap();

        let mail = Arc::new(RecordingMail::default());
        let results = fixture
            .dispatcher(mail.clone(), Arc::new(RecordingVoice::default()))
            .dispatch(&fixture.message())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].destination_id, kept);
        assert_eq!(mail.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_account_without_groups() {
        let fixture = Fixture::new();
        let results = fixture
            .dispatcher(
                Arc::new(RecordingMail::default()),
                Arc::new(RecordingVoice::default()),
            )
            .dispatch(&fixture.message())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_schedule_result_skips_telephone() {
        let fixture = Fixture::new();
        let email = fixture.email("ops@example.com");
        let phone = fixture.telephone("090-1234-5678");
        fixture.group(&[email, phone]);
        let schedule = Schedule {
            id: 3,
            name: "nightly-stop".to_string(),
            aws_environment_id: fixture.account.id,
        };

        let mail = Arc::new(RecordingMail::default());
        let voice = Arc::new(RecordingVoice::default());
        let results = fixture
            .dispatcher(mail.clone(), voice.clone())
            .dispatch_schedule_result(&schedule, false)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].outcome, DeliveryOutcome::Delivered);
        assert_eq!(results[1].outcome, DeliveryOutcome::Skipped);
        assert!(voice.calls().is_empty());
        assert!(mail.sent()[0].2.contains("失敗"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_destination_times_out() {
        let fixture = Fixture::new();
        let slow = fixture.telephone("090-1234-5678");
        let fast = fixture.email("ops@example.com");
        fixture.group(&[slow, fast]);

        let mail = Arc::new(RecordingMail::default());
        let voice = Arc::new(RecordingVoice::delayed(Duration::from_secs(120)));
        let results = fixture
            .dispatcher(mail.clone(), voice)
            .dispatch(&fixture.message())
            .await
            .unwrap();

        assert!(matches!(&results[0].outcome, DeliveryOutcome::Failed(text) if text.contains("timed out")));
        assert_eq!(results[1].outcome, DeliveryOutcome::Delivered);
        assert_eq!(mail.sent().len(), 1);
    }
}
