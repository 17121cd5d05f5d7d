//! Notification Error Types

use storage::StorageError;
use thiserror::Error;

/// Failure of a single mail or voice delivery
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    #[error("Delivery timed out after {0}s")]
    Timeout(u64),
}

/// Failure to resolve who should be notified
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Topology lookup failed: {0}")]
    Topology(#[from] StorageError),

    #[error("Channel setup failed: {0}")]
    Setup(String),
}
