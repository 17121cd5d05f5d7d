//! Storage Layer
//!
//! Tenant, AWS account and notification topology records behind a
//! repository. Archived (soft-deleted) rows are kept but never returned by
//! any read path.

mod models;
mod repository;

pub use models::{
    AwsEnvironment, DestinationKind, Lifecycle, NotificationDestination, NotificationGroup,
    RecordId, Tenant,
};
pub use repository::Repository;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Conflicting record: {0}")]
    Conflict(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}
