//! Monitored Service Catalog
//!
//! Static per-service facts: CloudWatch namespace, the dimension that
//! identifies a resource, the monitored metrics and their display names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::MonitoringError;

/// Prefix shared by every namespace of the cloud provider
pub const NAMESPACE_PREFIX: &str = "AWS/";

const EC2_METRICS: &[(&str, &str)] = &[
    ("StatusCheckFailed", "死活監視"),
    ("CPUUtilization", "CPU使用率"),
    ("DiskReadBytes", "ディスク読込量"),
    ("DiskWriteBytes", "ディスク書込量"),
    ("NetworkIn", "ネットワーク受信量"),
    ("NetworkOut", "ネットワーク送信量"),
];

const RDS_METRICS: &[(&str, &str)] = &[
    ("CPUUtilization", "CPU使用率"),
    ("FreeableMemory", "メモリ空容量"),
    ("ReadIOPS", "ディスク読取回数"),
    ("WriteIOPS", "ディスク書込回数"),
    ("NetworkReceiveThroughput", "読込スループット"),
    ("NetworkTransmitThroughput", "書込スループット"),
    ("DatabaseConnections", "DBコネクション数"),
    ("ReplicaLag", "レプリカ遅延秒数"),
];

const ELB_METRICS: &[(&str, &str)] = &[
    ("Latency", "レイテンシー"),
    ("RequestCount", "リクエストカウント"),
    ("HealthyHostCount", "正常EC2数"),
    ("UnHealthyHostCount", "危険EC2数"),
    ("HTTPCode_ELB_4XX", "HTTPレスポンスコード(4xx)"),
    ("HTTPCode_ELB_5XX", "HTTPレスポンスコード(5xx)"),
];

const REGIONS: &[(&str, &str)] = &[
    ("US East (N. Virginia)", "バージニア北部"),
    ("US East (Ohio)", "オハイオ"),
    ("US West (N. California)", "北カリフォルニア"),
    ("US West (Oregon)", "オレゴン"),
    ("Canada (Central)", "中部"),
    ("EU (Frankfurt)", "フランクフルト"),
    ("EU (Ireland)", "アイルランド"),
    ("EU (London)", "ロンドン"),
    ("EU (Paris)", "パリ"),
    ("Asia Pacific (Tokyo)", "東京"),
    ("Asia Pacific (Seoul)", "ソウル"),
    ("Asia Pacific (Singapore)", "シンガポール"),
    ("Asia Pacific (Sydney)", "シドニー"),
    ("Asia Pacific (Mumbai)", "ムンバイ"),
    ("South America (São Paulo)", "サンパウロ"),
];

/// Localized display name of a region, falling back to the input
pub fn region_display_name(region: &str) -> &str {
    REGIONS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, display)| *display)
        .unwrap_or(region)
}

/// Monitored service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceKind {
    Ec2,
    Rds,
    Elb,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 3] = [ServiceKind::Ec2, ServiceKind::Rds, ServiceKind::Elb];

    /// Service name as it appears in alarm names ("EC2", "RDS", "ELB")
    pub fn name(self) -> &'static str {
        match self {
            ServiceKind::Ec2 => "EC2",
            ServiceKind::Rds => "RDS",
            ServiceKind::Elb => "ELB",
        }
    }

    pub fn namespace(self) -> &'static str {
        match self {
            ServiceKind::Ec2 => "AWS/EC2",
            ServiceKind::Rds => "AWS/RDS",
            ServiceKind::Elb => "AWS/ELB",
        }
    }

    /// Dimension name holding the resource id
    pub fn id_dimension(self) -> &'static str {
        match self {
            ServiceKind::Ec2 => "InstanceId",
            ServiceKind::Rds => "DBInstanceIdentifier",
            ServiceKind::Elb => "LoadBalancerName",
        }
    }

    fn metric_table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ServiceKind::Ec2 => EC2_METRICS,
            ServiceKind::Rds => RDS_METRICS,
            ServiceKind::Elb => ELB_METRICS,
        }
    }

    /// Monitored metric names, in display order
    pub fn metrics(self) -> impl Iterator<Item = &'static str> {
        self.metric_table().iter().map(|(name, _)| *name)
    }

    pub fn has_metric(self, metric: &str) -> bool {
        self.metrics().any(|name| name == metric)
    }

    /// Localized metric name, falling back to the raw metric name
    pub fn metric_display_name(self, metric: &str) -> String {
        self.metric_table()
            .iter()
            .find(|(name, _)| *name == metric)
            .map(|(_, display)| (*display).to_string())
            .unwrap_or_else(|| metric.to_string())
    }

    /// Classify a CloudWatch namespace ("AWS/EC2" -> EC2)
    pub fn from_namespace(namespace: &str) -> Result<Self, MonitoringError> {
        namespace
            .strip_prefix(NAMESPACE_PREFIX)
            .and_then(|id| id.parse().ok())
            .filter(|service: &ServiceKind| service.namespace() == namespace)
            .ok_or_else(|| MonitoringError::UnknownNamespace(namespace.to_string()))
    }
}

impl FromStr for ServiceKind {
    type Err = MonitoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ec2" => Ok(ServiceKind::Ec2),
            "rds" => Ok(ServiceKind::Rds),
            "elb" => Ok(ServiceKind::Elb),
            _ => Err(MonitoringError::UnknownService(s.to_string())),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A monitored resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub region: String,
    pub service: ServiceKind,
    pub resource_id: String,
}

impl Resource {
    pub fn new(region: impl Into<String>, service: ServiceKind, resource_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service,
            resource_id: resource_id.into(),
        }
    }

    pub fn region_display_name(&self) -> &str {
        region_display_name(&self.region)
    }

    pub fn metric_display_name(&self, metric: &str) -> String {
        self.service.metric_display_name(metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_namespace() {
        assert_eq!(ServiceKind::from_namespace("AWS/EC2").unwrap(), ServiceKind::Ec2);
        assert_eq!(ServiceKind::from_namespace("AWS/RDS").unwrap(), ServiceKind::Rds);
        assert_eq!(ServiceKind::from_namespace("AWS/ELB").unwrap(), ServiceKind::Elb);
        assert!(ServiceKind::from_namespace("AWS/Lambda").is_err());
    }

    #[test]
    fn test_from_namespace_requires_exact_form() {
        assert!(ServiceKind::from_namespace("EC2").is_err());
        assert!(ServiceKind::from_namespace("ec2").is_err());
        assert!(ServiceKind::from_namespace("AWS/ec2").is_err());
        assert!(ServiceKind::from_namespace("aws/EC2").is_err());
    }

    #[test]
    fn test_id_dimensions() {
        assert_eq!(ServiceKind::Ec2.id_dimension(), "InstanceId");
        assert_eq!(ServiceKind::Rds.id_dimension(), "DBInstanceIdentifier");
        assert_eq!(ServiceKind::Elb.id_dimension(), "LoadBalancerName");
    }

    #[test]
    fn test_display_names() {
        let resource = Resource::new("Asia Pacific (Tokyo)", ServiceKind::Rds, "db-1");
        assert_eq!(resource.region_display_name(), "東京");
        assert_eq!(resource.metric_display_name("FreeableMemory"), "メモリ空容量");
        assert_eq!(resource.metric_display_name("Unknown"), "Unknown");
        assert_eq!(region_display_name("Mars (Olympus)"), "Mars (Olympus)");
    }

    #[test]
    fn test_metric_lists() {
        assert_eq!(ServiceKind::Ec2.metrics().count(), 6);
        assert_eq!(ServiceKind::Rds.metrics().count(), 8);
        assert!(ServiceKind::Elb.has_metric("HealthyHostCount"));
        assert!(!ServiceKind::Ec2.has_metric("HealthyHostCount"));
    }
}
