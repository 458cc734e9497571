//! Scheduler lifecycle commands.

use std::time::Instant;

use shomer_domain::{Result, SchedulerStatus};

use crate::commands::log_command_outcome;
use crate::context::AppContext;

/// Start the scheduler: weekly sweep plus an immediate catch-up sweep.
pub async fn start_scheduler(ctx: &AppContext) -> Result<()> {
    let start = Instant::now();
    let result = ctx.scheduler.lock().await.start().await;
    log_command_outcome("scheduler::start", start.elapsed(), result.is_ok());
    result.map_err(Into::into)
}

/// Stop the scheduler, cancelling every armed timer.
pub async fn stop_scheduler(ctx: &AppContext) -> Result<()> {
    let start = Instant::now();
    let result = ctx.scheduler.lock().await.stop().await;
    log_command_outcome("scheduler::stop", start.elapsed(), result.is_ok());
    result.map_err(Into::into)
}

/// Re-resolve and re-arm one user's timers immediately.
pub async fn refresh_user_schedule(ctx: &AppContext, user_id: &str) -> Result<()> {
    let start = Instant::now();
    let result = ctx.scheduler.lock().await.refresh_user(user_id).await;
    log_command_outcome("scheduler::refresh_user", start.elapsed(), result.is_ok());
    result
}

/// Snapshot of the scheduler state and armed timers.
pub async fn scheduler_status(ctx: &AppContext) -> SchedulerStatus {
    ctx.scheduler.lock().await.status().await
}
