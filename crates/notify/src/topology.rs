//! Notification Topology
//!
//! Read projections from an account to its live groups and from a group to
//! its live destinations.

use storage::{NotificationDestination, NotificationGroup, RecordId, Repository};

use crate::NotifyError;

pub trait NotificationTopology: Send + Sync {
    /// Live groups notified for an account
    fn groups_for(&self, aws_environment_id: RecordId) -> Result<Vec<NotificationGroup>, NotifyError>;

    /// Live destinations of a group
    fn destinations_for(&self, group: &NotificationGroup) -> Result<Vec<NotificationDestination>, NotifyError>;
}

impl NotificationTopology for Repository {
    fn groups_for(&self, aws_environment_id: RecordId) -> Result<Vec<NotificationGroup>, NotifyError> {
        Ok(self.groups_for_account(aws_environment_id)?)
    }

    fn destinations_for(&self, group: &NotificationGroup) -> Result<Vec<NotificationDestination>, NotifyError> {
        Ok(self.destinations_for_group(group.id)?)
    }
}
