//! User settings commands.
//!
//! Settings changes re-arm the user's timers immediately instead of waiting
//! for the weekly sweep.

use std::time::Instant;

use shomer_core::UserRepository;
use shomer_domain::{ManualOverride, Result, ShomerError, UserAccount};
use tracing::warn;

use crate::commands::log_command_outcome;
use crate::context::AppContext;

/// Persist a user's settings and re-arm their timers.
pub async fn update_user_settings(ctx: &AppContext, user: &UserAccount) -> Result<()> {
    let start = Instant::now();
    let result = upsert_and_refresh(ctx, user).await;
    log_command_outcome("settings::update_user_settings", start.elapsed(), result.is_ok());
    result
}

/// Store an administrator-supplied override interval and re-arm.
pub async fn set_manual_override(
    ctx: &AppContext,
    user_id: &str,
    over: &ManualOverride,
) -> Result<()> {
    let start = Instant::now();
    let result = async {
        ctx.users.set_override(user_id, over).await?;
        refresh(ctx, user_id).await;
        Ok(())
    }
    .await;
    log_command_outcome("settings::set_manual_override", start.elapsed(), result.is_ok());
    result
}

async fn upsert_and_refresh(ctx: &AppContext, user: &UserAccount) -> Result<()> {
    ctx.users.upsert(user).await?;
    refresh(ctx, &user.id).await;
    Ok(())
}

/// Settings are already saved at this point; a re-arm failure is logged
/// rather than surfaced, the weekly sweep will retry.
async fn refresh(ctx: &AppContext, user_id: &str) {
    if let Err(err) = ctx.scheduler.lock().await.refresh_user(user_id).await {
        match err {
            ShomerError::NotFound(_) => {
                warn!(user_id, "settings saved but user not found for re-arming");
            }
            other => {
                warn!(user_id, error = %other, "settings saved but timers were not re-armed");
            }
        }
    }
}
