//! User account types
//!
//! User accounts stored in the local database. Subscription tier and the
//! per-user offsets drive whether and when automation runs.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Subscription tier; only premium accounts are scheduled for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Premium,
}

impl SubscriptionTier {
    /// Parse from the database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Self::Free),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }

    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }
}

/// How a user's quiet period is determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "location", rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Weekly times resolved from the built-in location table.
    Location(String),
    /// Administrator-supplied override interval, stored per user.
    Manual,
}

/// How far before the quiet period entry content is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HideOffset {
    AtEntry,
    Before15Min,
    Before30Min,
    Before1Hour,
}

impl HideOffset {
    /// Offset subtracted from the quiet period entry instant.
    pub fn duration(&self) -> Duration {
        match self {
            Self::AtEntry => Duration::zero(),
            Self::Before15Min => Duration::minutes(15),
            Self::Before30Min => Duration::minutes(30),
            Self::Before1Hour => Duration::hours(1),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "at_entry" => Some(Self::AtEntry),
            "before_15_min" => Some(Self::Before15Min),
            "before_30_min" => Some(Self::Before30Min),
            "before_1_hour" => Some(Self::Before1Hour),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtEntry => "at_entry",
            Self::Before15Min => "before_15_min",
            Self::Before30Min => "before_30_min",
            Self::Before1Hour => "before_1_hour",
        }
    }
}

/// How far after the quiet period exit content is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOffset {
    AtExit,
    After30Min,
    After1Hour,
}

impl RestoreOffset {
    /// Offset added to the quiet period exit instant.
    pub fn duration(&self) -> Duration {
        match self {
            Self::AtExit => Duration::zero(),
            Self::After30Min => Duration::minutes(30),
            Self::After1Hour => Duration::hours(1),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "at_exit" => Some(Self::AtExit),
            "after_30_min" => Some(Self::After30Min),
            "after_1_hour" => Some(Self::After1Hour),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtExit => "at_exit",
            Self::After30Min => "after_30_min",
            Self::After1Hour => "after_1_hour",
        }
    }
}

/// User account stored in the local database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    pub tier: SubscriptionTier,
    pub schedule_mode: ScheduleMode,
    pub hide_offset: HideOffset,
    pub restore_offset: RestoreOffset,
    /// Per-user kill switch; automation is skipped entirely when false.
    pub automation_enabled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hide_offset_durations() {
        assert_eq!(HideOffset::AtEntry.duration(), Duration::zero());
        assert_eq!(HideOffset::Before15Min.duration(), Duration::minutes(15));
        assert_eq!(HideOffset::Before30Min.duration(), Duration::minutes(30));
        assert_eq!(HideOffset::Before1Hour.duration(), Duration::hours(1));
    }

    #[test]
    fn restore_offset_durations() {
        assert_eq!(RestoreOffset::AtExit.duration(), Duration::zero());
        assert_eq!(RestoreOffset::After30Min.duration(), Duration::minutes(30));
        assert_eq!(RestoreOffset::After1Hour.duration(), Duration::hours(1));
    }

    #[test]
    fn offset_round_trips_through_db_representation() {
        for offset in
            [HideOffset::AtEntry, HideOffset::Before15Min, HideOffset::Before30Min, HideOffset::Before1Hour]
        {
            assert_eq!(HideOffset::parse(offset.as_str()), Some(offset));
        }
        for offset in [RestoreOffset::AtExit, RestoreOffset::After30Min, RestoreOffset::After1Hour] {
            assert_eq!(RestoreOffset::parse(offset.as_str()), Some(offset));
        }
        assert_eq!(HideOffset::parse("bogus"), None);
    }
}
