//! Platform-facing types: tokens, content items, locks, pass results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External platform identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    YouTube,
    Facebook,
}

impl Platform {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "youtube" => Some(Self::YouTube),
            "facebook" => Some(Self::Facebook),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Facebook => "facebook",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque visibility value round-tripped to the platform.
///
/// The executor never interprets the contents beyond equality against the
/// adapter's hidden sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Visibility(pub String);

impl Visibility {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-user, per-platform credential record.
///
/// Secret material is encrypted at rest; this struct only exists decrypted
/// transiently while a pass runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformToken {
    pub user_id: String,
    pub platform: Platform,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl PlatformToken {
    /// True when the access token expires within `buffer_secs` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, buffer_secs: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now + chrono::Duration::seconds(buffer_secs),
            None => false,
        }
    }
}

/// One toggle-able content item as reported by a platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub visibility: Visibility,
}

/// User-managed exemption from automatic visibility changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentLock {
    pub user_id: String,
    pub platform: Platform,
    pub content_id: String,
    pub locked: bool,
    pub reason: String,
}

/// Visibility an item held immediately before an automatic hide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalStatus {
    pub user_id: String,
    pub platform: Platform,
    pub content_id: String,
    pub original_visibility: Visibility,
    pub recorded_at: i64,
}

/// Kind of executor pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    Hide,
    Restore,
}

impl PassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Restore => "restore",
        }
    }
}

/// Outcome of one platform's portion of a pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformOutcome {
    pub platform: Platform,
    /// Items considered on this platform.
    pub total: usize,
    /// Items whose visibility was changed.
    pub affected: usize,
    /// Items whose mutation failed.
    pub failed: usize,
    /// Items skipped because they are locked.
    pub skipped_locked: usize,
    /// Platform-level failure (auth, listing, timeout), if any.
    pub error: Option<String>,
}

impl PlatformOutcome {
    /// A platform-level failure before any item was considered.
    pub fn failure(platform: Platform, error: impl Into<String>) -> Self {
        Self { platform, total: 0, affected: 0, failed: 0, skipped_locked: 0, error: Some(error.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.failed == 0
    }
}

/// Aggregate result of one hide or restore pass for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport {
    pub user_id: String,
    pub kind: PassKind,
    pub started_at: DateTime<Utc>,
    pub platforms: Vec<PlatformOutcome>,
}

impl PassReport {
    pub fn affected(&self) -> usize {
        self.platforms.iter().map(|p| p.affected).sum()
    }

    pub fn failed(&self) -> usize {
        self.platforms.iter().map(|p| p.failed).sum()
    }

    pub fn is_success(&self) -> bool {
        self.platforms.iter().all(PlatformOutcome::is_success)
    }
}
