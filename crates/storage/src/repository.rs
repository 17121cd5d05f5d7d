//! Repository Implementation

use crate::models::{
    AwsEnvironment, DestinationKind, Lifecycle, NotificationDestination, NotificationGroup,
    RecordId, Tenant,
};
use crate::StorageError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Default)]
struct Tables {
    next_id: RecordId,
    tenants: BTreeMap<RecordId, Tenant>,
    aws_environments: BTreeMap<RecordId, AwsEnvironment>,
    destinations: BTreeMap<RecordId, NotificationDestination>,
    groups: BTreeMap<RecordId, NotificationGroup>,
}

impl Tables {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }

    fn active_tenant(&self, tenant_id: RecordId) -> Result<&Tenant, StorageError> {
        self.tenants
            .get(&tenant_id)
            .filter(|t| t.lifecycle.is_active())
            .ok_or_else(|| StorageError::NotFound(format!("tenant {}", tenant_id)))
    }
}

/// Repository for tenant and notification topology data (in-memory)
///
/// Every read path returns active rows only; archiving never removes a row.
pub struct Repository {
    tables: Mutex<Tables>,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        info!("Creating in-memory repository");
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
    }

    /// Insert a tenant
    pub fn create_tenant(&self, name: &str) -> Result<Tenant, StorageError> {
        let mut tables = self.tables()?;
        let tenant = Tenant {
            id: tables.allocate_id(),
            name: name.to_string(),
            lifecycle: Lifecycle::Active,
        };
        tables.tenants.insert(tenant.id, tenant.clone());
        debug!("Inserted tenant with ID {}", tenant.id);
        Ok(tenant)
    }

    /// Register an AWS account; one active row per external account id
    pub fn create_aws_environment(
        &self,
        tenant_id: RecordId,
        name: &str,
        aws_account_id: &str,
    ) -> Result<AwsEnvironment, StorageError> {
        let mut tables = self.tables()?;
        tables.active_tenant(tenant_id)?;

        if tables
            .aws_environments
            .values()
            .any(|a| a.lifecycle.is_active() && a.aws_account_id == aws_account_id)
        {
            return Err(StorageError::Conflict(format!(
                "aws account {} is already registered",
                aws_account_id
            )));
        }

        let environment = AwsEnvironment {
            id: tables.allocate_id(),
            name: name.to_string(),
            aws_account_id: aws_account_id.to_string(),
            tenant_id,
            lifecycle: Lifecycle::Active,
        };
        tables.aws_environments.insert(environment.id, environment.clone());
        debug!("Inserted aws environment with ID {}", environment.id);
        Ok(environment)
    }

    /// Insert a notification destination
    pub fn create_destination(
        &self,
        tenant_id: RecordId,
        name: &str,
        kind: DestinationKind,
    ) -> Result<NotificationDestination, StorageError> {
        let mut tables = self.tables()?;
        tables.active_tenant(tenant_id)?;

        let destination = NotificationDestination {
            id: tables.allocate_id(),
            name: name.to_string(),
            tenant_id,
            kind,
            lifecycle: Lifecycle::Active,
        };
        tables.destinations.insert(destination.id, destination.clone());
        debug!("Inserted destination with ID {}", destination.id);
        Ok(destination)
    }

    /// Insert a notification group
    ///
    /// Referenced destinations and accounts must be active and belong to the
    /// group's tenant.
    pub fn create_group(
        &self,
        tenant_id: RecordId,
        name: &str,
        destination_ids: &[RecordId],
        aws_environment_ids: &[RecordId],
    ) -> Result<NotificationGroup, StorageError> {
        let mut tables = self.tables()?;
        tables.active_tenant(tenant_id)?;

        for id in destination_ids {
            let valid = tables
                .destinations
                .get(id)
                .is_some_and(|d| d.lifecycle.is_active() && d.tenant_id == tenant_id);
            if !valid {
                return Err(StorageError::InvalidReference(format!("destination {}", id)));
            }
        }
        for id in aws_environment_ids {
            let valid = tables
                .aws_environments
                .get(id)
                .is_some_and(|a| a.lifecycle.is_active() && a.tenant_id == tenant_id);
            if !valid {
                return Err(StorageError::InvalidReference(format!("aws environment {}", id)));
            }
        }

        let group = NotificationGroup {
            id: tables.allocate_id(),
            name: name.to_string(),
            tenant_id,
            destination_ids: destination_ids.iter().copied().collect::<BTreeSet<_>>(),
            aws_environment_ids: aws_environment_ids.iter().copied().collect::<BTreeSet<_>>(),
            lifecycle: Lifecycle::Active,
        };
        tables.groups.insert(group.id, group.clone());
        debug!("Inserted notification group with ID {}", group.id);
        Ok(group)
    }

    /// Archive a tenant together with everything it owns
    pub fn archive_tenant(&self, tenant_id: RecordId) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        let tenant = tables
            .tenants
            .get_mut(&tenant_id)
            .ok_or_else(|| StorageError::NotFound(format!("tenant {}", tenant_id)))?;
        tenant.lifecycle = Lifecycle::Archived;

        let Tables {
            aws_environments,
            destinations,
            groups,
            ..
        } = &mut *tables;
        aws_environments
            .values_mut()
            .filter(|a| a.tenant_id == tenant_id)
            .for_each(|a| a.lifecycle = Lifecycle::Archived);
        destinations
            .values_mut()
            .filter(|d| d.tenant_id == tenant_id)
            .for_each(|d| d.lifecycle = Lifecycle::Archived);
        groups
            .values_mut()
            .filter(|g| g.tenant_id == tenant_id)
            .for_each(|g| g.lifecycle = Lifecycle::Archived);

        info!("Archived tenant {} and its records", tenant_id);
        Ok(())
    }

    pub fn archive_aws_environment(&self, id: RecordId) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        let environment = tables
            .aws_environments
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("aws environment {}", id)))?;
        environment.lifecycle = Lifecycle::Archived;
        Ok(())
    }

    pub fn archive_destination(&self, id: RecordId) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        let destination = tables
            .destinations
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("destination {}", id)))?;
        destination.lifecycle = Lifecycle::Archived;
        Ok(())
    }

    pub fn archive_group(&self, id: RecordId) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        let group = tables
            .groups
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("notification group {}", id)))?;
        group.lifecycle = Lifecycle::Archived;
        Ok(())
    }

    /// Active account holding the external account id
    pub fn account_by_external_id(&self, aws_account_id: &str) -> Result<AwsEnvironment, StorageError> {
        let tables = self.tables()?;
        tables
            .aws_environments
            .values()
            .find(|a| a.lifecycle.is_active() && a.aws_account_id == aws_account_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("aws account {}", aws_account_id)))
    }

    /// Active groups notified for an account, ordered by id
    pub fn groups_for_account(&self, aws_environment_id: RecordId) -> Result<Vec<NotificationGroup>, StorageError> {
        let tables = self.tables()?;
        Ok(tables
            .groups
            .values()
            .filter(|g| g.lifecycle.is_active() && g.aws_environment_ids.contains(&aws_environment_id))
            .cloned()
            .collect())
    }

    /// Active destinations of a group, ordered by id
    pub fn destinations_for_group(&self, group_id: RecordId) -> Result<Vec<NotificationDestination>, StorageError> {
        let tables = self.tables()?;
        let group = tables
            .groups
            .get(&group_id)
            .filter(|g| g.lifecycle.is_active())
            .ok_or_else(|| StorageError::NotFound(format!("notification group {}", group_id)))?;

        Ok(group
            .destination_ids
            .iter()
            .filter_map(|id| tables.destinations.get(id))
            .filter(|d| d.lifecycle.is_active())
            .cloned()
            .collect())
    }

    /// Active destinations of a tenant
    pub fn destinations_for_tenant(&self, tenant_id: RecordId) -> Result<Vec<NotificationDestination>, StorageError> {
        let tables = self.tables()?;
        Ok(tables
            .destinations
            .values()
            .filter(|d| d.lifecycle.is_active() && d.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    /// Get total active group count
    pub fn group_count(&self) -> usize {
        self.tables
            .lock()
            .map(|t| t.groups.values().filter(|g| g.lifecycle.is_active()).count())
            .unwrap_or(0)
    }

    /// Get total active destination count
    pub fn destination_count(&self) -> usize {
        self.tables
            .lock()
            .map(|t| t.destinations.values().filter(|d| d.lifecycle.is_active()).count())
            .unwrap_or(0)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
