//! API Route Handlers

pub mod metrics;
pub mod notify;
