//! Alarm Catalog
//!
//! Metric -> severity -> threshold model and generation of the alarm
//! definitions pushed to the alerting channel.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::level::{MonitorLevel, MonitorStatus};
use crate::record::Dimension;
use crate::service::Resource;

/// Metrics where a lower value is worse
const LESS_COMPARISON_METRICS: &[&str] = &["FreeableMemory", "HealthyHostCount"];

/// Monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Prefix of every alarm name managed by this system
    pub alarm_prefix: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            alarm_prefix: "MONITOR".to_string(),
        }
    }
}

/// Threshold comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    LessThanOrEqualToThreshold,
}

impl ComparisonOperator {
    /// "Lower is worse" for a fixed set of metrics, "higher is worse" otherwise
    pub fn for_metric(metric_name: &str) -> Self {
        if LESS_COMPARISON_METRICS.contains(&metric_name) {
            ComparisonOperator::LessThanOrEqualToThreshold
        } else {
            ComparisonOperator::GreaterThanOrEqualToThreshold
        }
    }
}

/// Per-metric monitor configuration and resolved status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorDefinition {
    pub metric_name: String,
    pub values: BTreeMap<MonitorLevel, Option<f64>>,
    pub enabled: Option<bool>,
    pub period: Option<u32>,
    pub evaluation_period: Option<u32>,
    pub statistic: Option<String>,
    pub comparison_operator: ComparisonOperator,
    pub status: MonitorStatus,
}

impl MonitorDefinition {
    /// Monitor with no thresholds configured
    pub fn unset(metric_name: impl Into<String>) -> Self {
        let metric_name = metric_name.into();
        Self {
            comparison_operator: ComparisonOperator::for_metric(&metric_name),
            metric_name,
            values: MonitorLevel::ALL.iter().map(|level| (*level, None)).collect(),
            enabled: None,
            period: None,
            evaluation_period: None,
            statistic: None,
            status: MonitorStatus::Unset,
        }
    }

    pub fn threshold(&self, level: MonitorLevel) -> Option<f64> {
        self.values.get(&level).copied().flatten()
    }
}

/// Alarm definition pushed to the alerting channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlarmDefinition {
    pub alarm_name: String,
    pub actions_enabled: bool,
    pub alarm_actions: Vec<String>,
    #[serde(rename = "OKActions")]
    pub ok_actions: Vec<String>,
    pub metric_name: String,
    pub namespace: String,
    pub statistic: Option<String>,
    pub dimensions: Vec<Dimension>,
    pub period: Option<u32>,
    pub evaluation_periods: u32,
    pub threshold: f64,
    pub comparison_operator: ComparisonOperator,
}

impl AlarmDefinition {
    pub fn has_recovery_action(&self) -> bool {
        !self.ok_actions.is_empty()
    }
}

/// Alarm naming and definition generation
#[derive(Debug, Clone)]
pub struct AlarmCatalog {
    config: MonitoringConfig,
}

impl AlarmCatalog {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    /// Prefix matching every managed alarm
    pub fn fleet_prefix(&self) -> String {
        format!("{}-", self.config.alarm_prefix)
    }

    /// Prefix matching every alarm of one resource
    pub fn resource_prefix(&self, resource: &Resource) -> String {
        format!(
            "{}-{}-{}-",
            self.config.alarm_prefix,
            resource.service.name(),
            resource.resource_id
        )
    }

    pub fn alarm_name(&self, resource: &Resource, metric_name: &str, level: MonitorLevel) -> String {
        format!("{}{}-{}", self.resource_prefix(resource), metric_name, level.code())
    }

    /// One alarm definition per level with a configured threshold
    ///
    /// Only the lowest level's alarm carries the recovery (OK) action.
    pub fn generate_alarm_definitions(
        &self,
        resource: &Resource,
        monitor: &MonitorDefinition,
        notify_target: &str,
    ) -> Vec<AlarmDefinition> {
        let comparison_operator = ComparisonOperator::for_metric(&monitor.metric_name);

        MonitorLevel::ALL
            .iter()
            .filter_map(|level| monitor.threshold(*level).map(|threshold| (*level, threshold)))
            .map(|(level, threshold)| {
                let ok_actions = if level.is_lowest_level() {
                    vec![notify_target.to_string()]
                } else {
                    Vec::new()
                };

                let definition = AlarmDefinition {
                    alarm_name: self.alarm_name(resource, &monitor.metric_name, level),
                    actions_enabled: monitor.enabled.unwrap_or(true),
                    alarm_actions: vec![notify_target.to_string()],
                    ok_actions,
                    metric_name: monitor.metric_name.clone(),
                    namespace: resource.service.namespace().to_string(),
                    statistic: monitor.statistic.clone(),
                    dimensions: vec![Dimension::new(
                        resource.service.id_dimension(),
                        resource.resource_id.clone(),
                    )],
                    period: monitor.period,
                    evaluation_periods: 1,
                    threshold,
                    comparison_operator,
                };
                debug!("Generated alarm definition {}", definition.alarm_name);
                definition
            })
            .collect()
    }
}

impl Default for AlarmCatalog {
    fn default() -> Self {
        Self::new(MonitoringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceKind;

    fn monitor(metric: &str, caution: Option<f64>, danger: Option<f64>) -> MonitorDefinition {
        let mut monitor = MonitorDefinition::unset(metric);
        monitor.values.insert(MonitorLevel::Caution, caution);
        monitor.values.insert(MonitorLevel::Danger, danger);
        monitor.enabled = Some(true);
        monitor.period = Some(300);
        monitor.statistic = Some("Average".to_string());
        monitor
    }

    #[test]
    fn test_comparison_operator() {
        assert_eq!(
            ComparisonOperator::for_metric("FreeableMemory"),
            ComparisonOperator::LessThanOrEqualToThreshold
        );
        assert_eq!(
            ComparisonOperator::for_metric("HealthyHostCount"),
            ComparisonOperator::LessThanOrEqualToThreshold
        );
        assert_eq!(
            ComparisonOperator::for_metric("CPUUtilization"),
            ComparisonOperator::GreaterThanOrEqualToThreshold
        );
    }

    #[test]
    fn test_only_lowest_level_has_recovery_action() {
        let catalog = AlarmCatalog::default();
        let resource = Resource::new("Asia Pacific (Tokyo)", ServiceKind::Ec2, "i-0abc");
        let definitions = catalog.generate_alarm_definitions(
            &resource,
            &monitor("CPUUtilization", Some(70.0), Some(90.0)),
            "arn:aws:sns:ap-northeast-1:123456789012:alarms",
        );

        assert_eq!(definitions.len(), 2);
        let with_recovery: Vec<_> = definitions
            .iter()
            .filter(|d| d.has_recovery_action())
            .map(|d| d.alarm_name.as_str())
            .collect();
        assert_eq!(with_recovery, vec!["MONITOR-EC2-i-0abc-CPUUtilization-CAUTION"]);
    }

    #[test]
    fn test_definition_shape() {
        let catalog = AlarmCatalog::default();
        let resource = Resource::new("Asia Pacific (Tokyo)", ServiceKind::Rds, "db-main");
        let definitions = catalog.generate_alarm_definitions(
            &resource,
            &monitor("FreeableMemory", None, Some(1024.0)),
            "topic",
        );

        assert_eq!(definitions.len(), 1);
        let danger = &definitions[0];
        assert_eq!(danger.alarm_name, "MONITOR-RDS-db-main-FreeableMemory-DANGER");
        assert_eq!(danger.namespace, "AWS/RDS");
        assert_eq!(danger.dimensions, vec![Dimension::new("DBInstanceIdentifier", "db-main")]);
        assert_eq!(danger.evaluation_periods, 1);
        assert_eq!(danger.threshold, 1024.0);
        assert_eq!(danger.comparison_operator, ComparisonOperator::LessThanOrEqualToThreshold);
        assert!(!danger.has_recovery_action());
        assert_eq!(danger.alarm_actions, vec!["topic".to_string()]);
    }

    #[test]
    fn test_prefixes() {
        let catalog = AlarmCatalog::new(MonitoringConfig {
            alarm_prefix: "OPS".to_string(),
        });
        let resource = Resource::new("EU (Ireland)", ServiceKind::Elb, "web-lb");
        assert_eq!(catalog.fleet_prefix(), "OPS-");
        assert_eq!(catalog.resource_prefix(&resource), "OPS-ELB-web-lb-");
    }
}
