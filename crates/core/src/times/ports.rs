//! Port interfaces for quiet period resolution
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use shomer_domain::{ManualOverride, QuietPeriod, Result, UserAccount};

/// Trait for resolving a user's next quiet period.
///
/// Implementations cover both location-table mode and the manual override
/// mode; an unresolvable period is reported as `ShomerError::NotFound`.
#[async_trait]
pub trait QuietPeriodSource: Send + Sync {
    /// Compute the next quiet period for the given user.
    async fn quiet_period(&self, user: &UserAccount) -> Result<QuietPeriod>;
}

/// Trait for reading the per-user manual override interval.
///
/// Only read by the quiet period source; writes happen through the
/// admin-facing user repository.
#[async_trait]
pub trait ManualOverrideStore: Send + Sync {
    /// Get the stored override for a user, if any.
    async fn get_override(&self, user_id: &str) -> Result<Option<ManualOverride>>;
}
