//! Alarm Monitoring
//!
//! Severity model for monitored metrics, generation of the alarm definitions
//! pushed to the alerting channel, and aggregation of the alarm states read
//! back from it.

mod aggregator;
mod audit;
mod catalog;
mod error;
mod level;
mod record;
mod service;

pub use aggregator::{
    aggregate_fleet_status, describe_resource_monitors, fetch_fleet_status,
    fetch_resource_monitors, FleetStatus,
};
pub use audit::{save_monitor, OperationAudit};
pub use catalog::{
    AlarmCatalog, AlarmDefinition, ComparisonOperator, MonitorDefinition, MonitoringConfig,
};
pub use error::MonitoringError;
pub use level::{MonitorLevel, MonitorStatus};
pub use record::{AlarmPage, AlarmSink, AlarmSource, AlarmState, Dimension, MetricAlarmRecord};
pub use service::{region_display_name, Resource, ServiceKind, NAMESPACE_PREFIX};
