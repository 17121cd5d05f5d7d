//! Alarm Write Path and Operation Audit

use serde::Serialize;
use tracing::{error, info};

use crate::catalog::{AlarmCatalog, AlarmDefinition, MonitorDefinition};
use crate::record::AlarmSink;
use crate::service::Resource;
use crate::MonitoringError;

/// Audit entry for an operator-initiated change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationAudit {
    pub actor: String,
    pub target: String,
    pub operation: String,
}

impl OperationAudit {
    pub fn new(actor: impl Into<String>, target: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            target: target.into(),
            operation: operation.into(),
        }
    }

    /// Audit entry for saving one metric's monitor on a resource
    pub fn save_monitor(
        actor: impl Into<String>,
        account_name: &str,
        account_id: &str,
        resource: &Resource,
        metric_name: &str,
    ) -> Self {
        let target = format!(
            "{}_{}_{}_{}_{}_{}",
            account_name,
            account_id,
            resource.region,
            resource.service.name(),
            resource.resource_id,
            metric_name
        );
        Self::new(actor, target, "save_monitor")
    }

    /// Emit the entry on the `audit` target
    pub fn record(&self, succeeded: bool) {
        if succeeded {
            info!(target: "audit", actor = %self.actor, target_desc = %self.target, operation = %self.operation, "operation succeeded");
        } else {
            error!(target: "audit", actor = %self.actor, target_desc = %self.target, operation = %self.operation, "operation failed");
        }
    }
}

/// Generate the alarms for `monitor` and push each one to `sink`
pub async fn save_monitor<S>(
    sink: &S,
    catalog: &AlarmCatalog,
    resource: &Resource,
    monitor: &MonitorDefinition,
    notify_target: &str,
    audit: &OperationAudit,
) -> Result<Vec<AlarmDefinition>, MonitoringError>
where
    S: AlarmSink + ?Sized,
{
    let result = push_definitions(sink, catalog, resource, monitor, notify_target).await;
    audit.record(result.is_ok());
    result
}

async fn push_definitions<S>(
    sink: &S,
    catalog: &AlarmCatalog,
    resource: &Resource,
    monitor: &MonitorDefinition,
    notify_target: &str,
) -> Result<Vec<AlarmDefinition>, MonitoringError>
where
    S: AlarmSink + ?Sized,
{
    if !resource.service.has_metric(&monitor.metric_name) {
        return Err(MonitoringError::UnsupportedMetric {
            service: resource.service.name().to_string(),
            metric: monitor.metric_name.clone(),
        });
    }

    let definitions = catalog.generate_alarm_definitions(resource, monitor, notify_target);
    for definition in &definitions {
        sink.put_metric_alarm(definition).await?;
    }

    info!(
        "Saved {} alarm(s) for {} {} {}",
        definitions.len(),
        resource.service,
        resource.resource_id,
        monitor.metric_name
    );
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::MonitorLevel;
    use crate::service::ServiceKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        names: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl AlarmSink for RecordingSink {
        async fn put_metric_alarm(&self, definition: &AlarmDefinition) -> Result<(), MonitoringError> {
            if self.fail {
                return Err(MonitoringError::Channel("throttled".to_string()));
            }
            self.names.lock().unwrap().push(definition.alarm_name.clone());
            Ok(())
        }
    }

    fn cpu_monitor() -> MonitorDefinition {
        let mut monitor = MonitorDefinition::unset("CPUUtilization");
        monitor.values.insert(MonitorLevel::Caution, Some(70.0));
        monitor.values.insert(MonitorLevel::Danger, Some(90.0));
        monitor
    }

    #[test]
    fn test_audit_target_description() {
        let resource = Resource::new("Asia Pacific (Tokyo)", ServiceKind::Ec2, "i-0abc");
        let audit = OperationAudit::save_monitor("alice", "prod", "123456789012", &resource, "CPUUtilization");
        assert_eq!(
            audit.target,
            "prod_123456789012_Asia Pacific (Tokyo)_EC2_i-0abc_CPUUtilization"
        );
        assert_eq!(audit.operation, "save_monitor");
    }

    #[tokio::test]
    async fn test_save_monitor_pushes_every_level() {
        let sink = RecordingSink::default();
        let resource = Resource::new("Asia Pacific (Tokyo)", ServiceKind::Ec2, "i-0abc");
        let audit = OperationAudit::save_monitor("alice", "prod", "123456789012", &resource, "CPUUtilization");

        let saved = save_monitor(&sink, &AlarmCatalog::default(), &resource, &cpu_monitor(), "topic", &audit)
            .await
            .unwrap();

        assert_eq!(saved.len(), 2);
        assert_eq!(
            *sink.names.lock().unwrap(),
            vec![
                "MONITOR-EC2-i-0abc-CPUUtilization-CAUTION".to_string(),
                "MONITOR-EC2-i-0abc-CPUUtilization-DANGER".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_save_monitor_rejects_foreign_metric() {
        let sink = RecordingSink::default();
        let resource = Resource::new("Asia Pacific (Tokyo)", ServiceKind::Rds, "db-1");
        let audit = OperationAudit::new("alice", "db-1", "save_monitor");

        let result = save_monitor(&sink, &AlarmCatalog::default(), &resource, &MonitorDefinition::unset("Latency"), "topic", &audit).await;
        assert!(matches!(result, Err(MonitoringError::UnsupportedMetric { .. })));
        assert!(sink.names.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_monitor_surfaces_channel_error() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let resource = Resource::new("Asia Pacific (Tokyo)", ServiceKind::Ec2, "i-0abc");
        let audit = OperationAudit::new("alice", "i-0abc", "save_monitor");

        let result = save_monitor(&sink, &AlarmCatalog::default(), &resource, &cpu_monitor(), "topic", &audit).await;
        assert!(matches!(result, Err(MonitoringError::Channel(_))));
    }
}
