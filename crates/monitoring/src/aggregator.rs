//! Alarm Status Aggregation
//!
//! Folds unordered, paginated alarm records into per-resource statuses
//! (fleet view) and per-metric monitor definitions (resource view).

use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::catalog::{AlarmCatalog, MonitorDefinition};
use crate::level::{MonitorLevel, MonitorStatus};
use crate::record::{AlarmSource, MetricAlarmRecord};
use crate::service::{Resource, ServiceKind};
use crate::MonitoringError;

/// Resolved status of every resource observed in one aggregation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetStatus {
    services: BTreeMap<ServiceKind, BTreeMap<String, MonitorStatus>>,
}

impl FleetStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch of records into the accumulator
    pub fn absorb<'a, I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = &'a MetricAlarmRecord>,
    {
        for record in batch {
            if let Err(e) = self.absorb_record(record) {
                warn!("Skipping alarm {}: {}", record.alarm_name, e);
            }
        }
    }

    fn absorb_record(&mut self, record: &MetricAlarmRecord) -> Result<(), MonitoringError> {
        let service = ServiceKind::from_namespace(&record.namespace)?;
        let resource_id = record
            .dimension(service.id_dimension())
            .ok_or(MonitoringError::MissingDimension(service.id_dimension()))?;
        let level = MonitorLevel::from_alarm_name(&record.alarm_name)?;

        let resources = self.services.entry(service).or_default();
        match resources.get_mut(resource_id) {
            None => {
                let seeded = if record.is_firing() {
                    level.status()
                } else {
                    MonitorStatus::Ok
                };
                resources.insert(resource_id.to_string(), seeded);
            }
            Some(existing) => {
                // Never downgrade: only a firing, strictly more severe level replaces.
                if record.is_firing() && level.status() > *existing {
                    *existing = level.status();
                }
            }
        }
        Ok(())
    }

    /// Status recorded for a resource, if any alarm was observed
    pub fn get(&self, service: ServiceKind, resource_id: &str) -> Option<MonitorStatus> {
        self.services
            .get(&service)
            .and_then(|resources| resources.get(resource_id))
            .copied()
    }

    /// Status of a resource, `UNSET` when no alarm was observed
    pub fn status_of(&self, resource: &Resource) -> MonitorStatus {
        self.get(resource.service, &resource.resource_id)
            .unwrap_or(MonitorStatus::Unset)
    }

    pub fn service(&self, service: ServiceKind) -> Option<&BTreeMap<String, MonitorStatus>> {
        self.services.get(&service)
    }

    pub fn resource_count(&self) -> usize {
        self.services.values().map(BTreeMap::len).sum()
    }
}

/// Fold every batch, in arrival order, into one fleet status
pub fn aggregate_fleet_status<'a, P, B>(pages: P) -> FleetStatus
where
    P: IntoIterator<Item = B>,
    B: IntoIterator<Item = &'a MetricAlarmRecord>,
{
    let mut fleet = FleetStatus::new();
    for batch in pages {
        fleet.absorb(batch);
    }
    fleet
}

/// Per-metric monitor view of one resource
///
/// Records belonging to another resource are ignored; a name prefix such as
/// `MONITOR-ELB-web-` also matches the alarms of `web-2`.
pub fn describe_resource_monitors(
    resource: &Resource,
    alarms: &[MetricAlarmRecord],
) -> Vec<MonitorDefinition> {
    let owned: Vec<&MetricAlarmRecord> = alarms
        .iter()
        .filter(|a| belongs_to(a, resource))
        .collect();

    resource
        .service
        .metrics()
        .map(|metric| {
            let matches: Vec<&MetricAlarmRecord> = owned
                .iter()
                .copied()
                .filter(|a| a.metric_name == metric)
                .collect();

            let Some(first) = matches.first() else {
                return MonitorDefinition::unset(metric);
            };

            let mut monitor = MonitorDefinition::unset(metric);
            let mut firing = Vec::new();
            for alarm in &matches {
                let level = match MonitorLevel::from_alarm_name(&alarm.alarm_name) {
                    Ok(level) => level,
                    Err(e) => {
                        warn!("Skipping alarm {}: {}", alarm.alarm_name, e);
                        continue;
                    }
                };
                monitor.values.insert(level, alarm.threshold);
                if alarm.is_firing() {
                    firing.push(level.status());
                }
            }

            monitor.status = MonitorStatus::max_of(firing);
            monitor.enabled = first.actions_enabled;
            monitor.period = first.period;
            monitor.evaluation_period = first.evaluation_periods;
            monitor.statistic = first.statistic.clone();
            monitor
        })
        .collect()
}

fn belongs_to(record: &MetricAlarmRecord, resource: &Resource) -> bool {
    let service = resource.service;
    if record.namespace != service.namespace() {
        return false;
    }
    match record.dimension(service.id_dimension()) {
        Some(id) => id == resource.resource_id,
        None => {
            debug!("Alarm {} has no {} dimension", record.alarm_name, service.id_dimension());
            false
        }
    }
}

async fn for_each_page<S, F>(source: &S, prefix: &str, mut on_page: F) -> Result<(), MonitoringError>
where
    S: AlarmSource + ?Sized,
    F: FnMut(Vec<MetricAlarmRecord>),
{
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = source.list_alarms(prefix, next_token.as_deref()).await?;
        pages += 1;
        debug!("Fetched alarm page {} ({} records)", pages, page.records.len());
        on_page(page.records);

        match page.next_token {
            Some(token) => next_token = Some(token),
            None => break,
        }
    }

    info!("Fetched {} alarm page(s) for prefix {}", pages, prefix);
    Ok(())
}

/// Follow the listing's pagination and fold every page into a fleet status
pub async fn fetch_fleet_status<S>(source: &S, catalog: &AlarmCatalog) -> Result<FleetStatus, MonitoringError>
where
    S: AlarmSource + ?Sized,
{
    let mut fleet = FleetStatus::new();
    for_each_page(source, &catalog.fleet_prefix(), |records| fleet.absorb(&records)).await?;
    Ok(fleet)
}

/// Fetch every alarm of `resource` and describe its monitors
pub async fn fetch_resource_monitors<S>(
    source: &S,
    catalog: &AlarmCatalog,
    resource: &Resource,
) -> Result<Vec<MonitorDefinition>, MonitoringError>
where
    S: AlarmSource + ?Sized,
{
    let mut records = Vec::new();
    for_each_page(source, &catalog.resource_prefix(resource), |page| records.extend(page)).await?;
    Ok(describe_resource_monitors(resource, &records))
}
