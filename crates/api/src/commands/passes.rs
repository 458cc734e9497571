//! Manual pass triggers.
//!
//! The same executor the scheduler drives, invoked on demand. History rows
//! are written by the executor itself.

use std::time::Instant;

use shomer_domain::{PassKind, PassReport, Result};

use crate::commands::log_command_outcome;
use crate::context::AppContext;

/// Hide the user's content across all connected platforms now.
pub async fn run_hide_pass(ctx: &AppContext, user_id: &str) -> Result<PassReport> {
    run_pass(ctx, user_id, PassKind::Hide).await
}

/// Restore previously hidden content across all connected platforms now.
pub async fn run_restore_pass(ctx: &AppContext, user_id: &str) -> Result<PassReport> {
    run_pass(ctx, user_id, PassKind::Restore).await
}

async fn run_pass(ctx: &AppContext, user_id: &str, kind: PassKind) -> Result<PassReport> {
    let start = Instant::now();
    let result = ctx.executor.run_pass(user_id, kind).await;
    let command = match kind {
        PassKind::Hide => "passes::run_hide_pass",
        PassKind::Restore => "passes::run_restore_pass",
    };
    log_command_outcome(command, start.elapsed(), result.is_ok());
    result
}
