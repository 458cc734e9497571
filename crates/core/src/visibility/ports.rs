//! Port interfaces for the visibility executor
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use shomer_domain::{
    ContentItem, ContentLock, HistoryEntry, ManualOverride, OriginalStatus, Platform,
    PlatformToken, Result, UserAccount, Visibility,
};

/// Trait for one external platform's content operations.
///
/// Visibility values are opaque to the executor; the only interpretation is
/// equality against [`PlatformAdapter::hidden_visibility`].
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Which platform this adapter talks to.
    fn platform(&self) -> Platform;

    /// The platform-specific "hidden" sentinel value.
    fn hidden_visibility(&self) -> Visibility;

    /// List the user's toggle-able content with current visibility.
    async fn list_content(&self, token: &PlatformToken) -> Result<Vec<ContentItem>>;

    /// Set one item's visibility.
    async fn set_visibility(
        &self,
        token: &PlatformToken,
        content_id: &str,
        visibility: &Visibility,
    ) -> Result<()>;

    /// Exchange the refresh token for a fresh access token.
    async fn refresh_token(&self, token: &PlatformToken) -> Result<PlatformToken>;
}

/// Trait for persisting platform credentials.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Get the token for a (user, platform) pair.
    async fn get(&self, user_id: &str, platform: Platform) -> Result<Option<PlatformToken>>;

    /// Platforms for which the user has a stored token.
    async fn list_platforms_for_user(&self, user_id: &str) -> Result<Vec<Platform>>;

    /// Save a token, overwriting any existing one for the pair.
    async fn save(&self, token: &PlatformToken) -> Result<()>;

    /// Remove the token for a (user, platform) pair.
    async fn remove(&self, user_id: &str, platform: Platform) -> Result<()>;
}

/// Trait for content lock lookups and user-driven updates.
#[async_trait]
pub trait LockRepository: Send + Sync {
    /// Whether an item is locked against automatic changes.
    async fn is_locked(&self, user_id: &str, platform: Platform, content_id: &str)
        -> Result<bool>;

    /// Create or update a lock (explicit user action only).
    async fn set_lock(&self, lock: &ContentLock) -> Result<()>;

    /// All locks for a user.
    async fn list_locks_for_user(&self, user_id: &str) -> Result<Vec<ContentLock>>;
}

/// Trait for the pre-hide visibility records that drive restoration.
#[async_trait]
pub trait OriginalStatusRepository: Send + Sync {
    /// Record an item's pre-hide visibility unless one already exists.
    /// Returns true when a new record was written.
    async fn record_if_absent(&self, status: &OriginalStatus) -> Result<bool>;

    /// All records for a (user, platform) pair.
    async fn list_for_user_platform(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Vec<OriginalStatus>>;

    /// Delete the record for one item after a successful restore.
    async fn delete(&self, user_id: &str, platform: Platform, content_id: &str) -> Result<()>;

    /// Drop every record for a user (administrative reset).
    async fn delete_all_for_user(&self, user_id: &str) -> Result<usize>;
}

/// Trait for the append-only pass history.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append one entry; entries are never mutated.
    async fn append(&self, entry: &HistoryEntry) -> Result<()>;

    /// Most recent entries for a user, newest first.
    async fn list_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>>;
}

/// Trait for user accounts and their schedule settings.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find one user.
    async fn find(&self, user_id: &str) -> Result<Option<UserAccount>>;

    /// All users that could be scheduled (before gating).
    async fn list_automation_candidates(&self) -> Result<Vec<UserAccount>>;

    /// Create or update a user record.
    async fn upsert(&self, user: &UserAccount) -> Result<()>;

    /// Store the manual override interval for a user.
    async fn set_override(&self, user_id: &str, over: &ManualOverride) -> Result<()>;
}

/// Subscription gate consulted before scheduling any user.
pub trait SubscriptionGate: Send + Sync {
    /// Whether automation may run for this user at all.
    fn is_eligible(&self, user: &UserAccount) -> bool;
}
