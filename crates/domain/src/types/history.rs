//! Append-only history of executor passes

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::AGGREGATE_PLATFORM_LABEL;
use crate::types::platform::{PassKind, PassReport, PlatformOutcome};

/// One append-only record of a hide or restore outcome.
///
/// Written once per platform per pass, plus one aggregate row whose
/// `platform` is [`AGGREGATE_PLATFORM_LABEL`]. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub user_id: String,
    pub timestamp: i64,
    pub action: PassKind,
    pub platform: String,
    pub affected: i64,
    pub failed: i64,
    pub success: bool,
    pub error: Option<String>,
}

impl HistoryEntry {
    /// Build the per-platform row for one platform outcome.
    pub fn for_platform(report: &PassReport, outcome: &PlatformOutcome) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: report.user_id.clone(),
            timestamp: report.started_at.timestamp(),
            action: report.kind,
            platform: outcome.platform.as_str().to_string(),
            affected: outcome.affected as i64,
            failed: outcome.failed as i64,
            success: outcome.is_success(),
            error: outcome.error.clone(),
        }
    }

    /// Build the aggregate row for a whole pass.
    pub fn aggregate(report: &PassReport) -> Self {
        let first_error =
            report.platforms.iter().find_map(|outcome| outcome.error.clone());
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: report.user_id.clone(),
            timestamp: report.started_at.timestamp(),
            action: report.kind,
            platform: AGGREGATE_PLATFORM_LABEL.to_string(),
            affected: report.affected() as i64,
            failed: report.failed() as i64,
            success: report.is_success(),
            error: first_error,
        }
    }
}
