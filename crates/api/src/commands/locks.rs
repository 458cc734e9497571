//! Content lock management.
//!
//! Locks are only ever written here, by explicit user action; the executor
//! reads them and never mutates them.

use std::time::Instant;

use shomer_core::LockRepository;
use shomer_domain::{ContentLock, Result};

use crate::commands::log_command_outcome;
use crate::context::AppContext;

/// Create, update, or clear a lock on one content item.
pub async fn set_content_lock(ctx: &AppContext, lock: &ContentLock) -> Result<()> {
    let start = Instant::now();
    let result = ctx.locks.set_lock(lock).await;
    log_command_outcome("locks::set_content_lock", start.elapsed(), result.is_ok());
    result
}

/// All locks the user has placed, across platforms.
pub async fn list_content_locks(ctx: &AppContext, user_id: &str) -> Result<Vec<ContentLock>> {
    let start = Instant::now();
    let result = ctx.locks.list_locks_for_user(user_id).await;
    log_command_outcome("locks::list_content_locks", start.elapsed(), result.is_ok());
    result
}
