//! Quiet period and scheduler status types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ShomerError};

/// Where a quiet period came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuietPeriodSourceKind {
    /// Projected from the built-in location table.
    Location(String),
    /// Administrator-supplied manual override.
    Manual,
}

/// The entry-to-exit interval during which content is hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietPeriod {
    pub entry: DateTime<Utc>,
    pub exit: DateTime<Utc>,
    pub source: QuietPeriodSourceKind,
}

impl QuietPeriod {
    /// Construct a validated quiet period. The interval must be well-ordered.
    pub fn new(
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
        source: QuietPeriodSourceKind,
    ) -> Result<Self> {
        if entry >= exit {
            return Err(ShomerError::InvalidInput(format!(
                "quiet period entry {entry} must precede exit {exit}"
            )));
        }
        Ok(Self { entry, exit, source })
    }
}

/// Administrator-supplied override interval for manual-mode users.
///
/// Endpoints are stored independently; an override only yields a quiet
/// period when both are present and well-ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverride {
    pub entry: Option<DateTime<Utc>>,
    pub exit: Option<DateTime<Utc>>,
}

impl ManualOverride {
    /// The validated interval, if the override is complete.
    pub fn interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.entry, self.exit) {
            (Some(entry), Some(exit)) if entry < exit => Some((entry, exit)),
            _ => None,
        }
    }
}

/// Armed-job view exposed by the scheduler status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmedJobInfo {
    pub user_id: String,
    pub hide_at: Option<DateTime<Utc>>,
    pub restore_at: Option<DateTime<Utc>>,
}

/// Snapshot of the scheduler's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub users: Vec<ArmedJobInfo>,
}
