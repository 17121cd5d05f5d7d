//! Stored Records

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type RecordId = i64;

/// Row lifecycle; archived rows are tombstones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Active,
    Archived,
}

impl Lifecycle {
    pub fn is_active(self) -> bool {
        self == Lifecycle::Active
    }
}

/// Tenant (customer organisation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: RecordId,
    pub name: String,
    pub lifecycle: Lifecycle,
}

/// Registered AWS account of a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsEnvironment {
    pub id: RecordId,
    pub name: String,
    /// External 12-digit account id
    pub aws_account_id: String,
    pub tenant_id: RecordId,
    pub lifecycle: Lifecycle,
}

/// Destination channel and its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DestinationKind {
    Email {
        address: String,
    },
    Telephone {
        phone_number: String,
        /// ISO 3166-1 alpha-2 region used to interpret `phone_number`
        country_code: String,
    },
}

impl DestinationKind {
    pub fn channel(&self) -> &'static str {
        match self {
            DestinationKind::Email { .. } => "email",
            DestinationKind::Telephone { .. } => "telephone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDestination {
    pub id: RecordId,
    pub name: String,
    pub tenant_id: RecordId,
    pub kind: DestinationKind,
    pub lifecycle: Lifecycle,
}

/// Named set of destinations notified for a set of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationGroup {
    pub id: RecordId,
    pub name: String,
    pub tenant_id: RecordId,
    pub destination_ids: BTreeSet<RecordId>,
    pub aws_environment_ids: BTreeSet<RecordId>,
    pub lifecycle: Lifecycle,
}
