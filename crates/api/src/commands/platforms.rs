//! Platform connection commands.
//!
//! Token material arrives from an external authorization flow; these
//! commands only persist or remove it. Disconnecting also clears any
//! recorded original visibilities so a later connection starts clean.

use std::time::Instant;

use shomer_core::{OriginalStatusRepository, TokenRepository};
use shomer_domain::{Platform, PlatformToken, Result};
use tracing::info;

use crate::commands::log_command_outcome;
use crate::context::AppContext;

/// Store (or overwrite) the credentials for one platform.
pub async fn connect_platform(ctx: &AppContext, token: &PlatformToken) -> Result<()> {
    let start = Instant::now();
    let result = ctx.tokens.save(token).await;
    log_command_outcome("platforms::connect_platform", start.elapsed(), result.is_ok());
    result
}

/// Remove the stored credentials and recorded originals for one platform.
pub async fn disconnect_platform(
    ctx: &AppContext,
    user_id: &str,
    platform: Platform,
) -> Result<()> {
    let start = Instant::now();
    let result = async {
        ctx.tokens.remove(user_id, platform).await?;
        let cleared = ctx.originals.delete_all_for_user(user_id).await?;
        info!(user_id, %platform, cleared, "platform disconnected");
        Ok(())
    }
    .await;
    log_command_outcome("platforms::disconnect_platform", start.elapsed(), result.is_ok());
    result
}
