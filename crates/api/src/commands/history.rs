//! Pass history queries.

use std::time::Instant;

use shomer_core::HistoryRepository;
use shomer_domain::{HistoryEntry, Result};

use crate::commands::log_command_outcome;
use crate::context::AppContext;

/// Most recent history entries for a user, newest first.
pub async fn get_history(ctx: &AppContext, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
    let start = Instant::now();
    let result = ctx.history.list_for_user(user_id, limit).await;
    log_command_outcome("history::get_history", start.elapsed(), result.is_ok());
    result
}
