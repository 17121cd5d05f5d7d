//! Severity Levels and Resolved Status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::MonitoringError;

/// Severity tier attached to one metric's threshold configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MonitorLevel {
    Caution,
    Danger,
}

impl MonitorLevel {
    /// All levels, lowest first
    pub const ALL: [MonitorLevel; 2] = [MonitorLevel::Caution, MonitorLevel::Danger];

    /// Only the lowest level may carry a recovery action
    pub fn is_lowest_level(self) -> bool {
        self == MonitorLevel::Caution
    }

    /// Alarm-name suffix for this level
    pub fn code(self) -> &'static str {
        match self {
            MonitorLevel::Caution => "CAUTION",
            MonitorLevel::Danger => "DANGER",
        }
    }

    /// Status reached when an alarm of this level fires
    pub fn status(self) -> MonitorStatus {
        match self {
            MonitorLevel::Caution => MonitorStatus::Caution,
            MonitorLevel::Danger => MonitorStatus::Danger,
        }
    }

    /// Extract the level from an alarm name (suffix after the final `-`)
    pub fn from_alarm_name(alarm_name: &str) -> Result<Self, MonitoringError> {
        let suffix = alarm_name
            .rsplit_once('-')
            .map(|(_, suffix)| suffix)
            .ok_or_else(|| MonitoringError::InvalidAlarmName(alarm_name.to_string()))?;
        suffix.parse()
    }
}

impl FromStr for MonitorLevel {
    type Err = MonitoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CAUTION" => Ok(MonitorLevel::Caution),
            "DANGER" => Ok(MonitorLevel::Danger),
            other => Err(MonitoringError::UnknownLevel(other.to_string())),
        }
    }
}

impl fmt::Display for MonitorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Resolved severity of a resource or metric
///
/// Variant order is the priority order used when merging alarm states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(i8)]
pub enum MonitorStatus {
    Unset = -1,
    Ok = 0,
    Caution = 1,
    Danger = 2,
}

impl MonitorStatus {
    /// Numeric rank (UNSET=-1 .. DANGER=2)
    pub fn rank(self) -> i8 {
        self as i8
    }

    /// Highest status in `statuses`, `OK` when empty
    pub fn max_of<I>(statuses: I) -> MonitorStatus
    where
        I: IntoIterator<Item = MonitorStatus>,
    {
        statuses.into_iter().fold(MonitorStatus::Ok, MonitorStatus::max)
    }

    pub fn label(self) -> &'static str {
        match self {
            MonitorStatus::Unset => "UNSET",
            MonitorStatus::Ok => "OK",
            MonitorStatus::Caution => "CAUTION",
            MonitorStatus::Danger => "DANGER",
        }
    }
}

impl From<MonitorLevel> for MonitorStatus {
    fn from(level: MonitorLevel) -> Self {
        level.status()
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
