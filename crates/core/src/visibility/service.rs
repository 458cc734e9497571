//! Visibility executor - core business logic
//!
//! Performs exactly one hide or restore pass for one user across all of the
//! user's connected platforms. Platforms run concurrently, each bounded by a
//! timeout; items within a platform run sequentially with a fixed delay
//! between mutations. Every outcome is appended to the history before the
//! pass returns, so "did this run and what happened" is always queryable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use shomer_domain::{
    ExecutorConfig, HistoryEntry, OriginalStatus, PassKind, PassReport, Platform,
    PlatformOutcome, PlatformToken, Result, ShomerError,
};
use tracing::{debug, error, info, instrument, warn};

use super::ports::{
    HistoryRepository, LockRepository, OriginalStatusRepository, PlatformAdapter, TokenRepository,
};

/// Executor tuning knobs, derived from the application config.
#[derive(Debug, Clone)]
pub struct VisibilityExecutorConfig {
    /// Delay between consecutive item mutations on one platform.
    pub item_delay: Duration,
    /// Upper bound for one platform's portion of a pass.
    pub platform_timeout: Duration,
    /// Tokens expiring within this window are refreshed before use.
    pub token_refresh_buffer_secs: i64,
}

impl Default for VisibilityExecutorConfig {
    fn default() -> Self {
        Self::from(&ExecutorConfig::default())
    }
}

impl From<&ExecutorConfig> for VisibilityExecutorConfig {
    fn from(config: &ExecutorConfig) -> Self {
        Self {
            item_delay: Duration::from_millis(config.item_delay_ms),
            platform_timeout: Duration::from_secs(config.platform_timeout_secs),
            token_refresh_buffer_secs: config.token_refresh_buffer_secs,
        }
    }
}

/// Visibility executor service
pub struct VisibilityExecutor {
    tokens: Arc<dyn TokenRepository>,
    locks: Arc<dyn LockRepository>,
    originals: Arc<dyn OriginalStatusRepository>,
    history: Arc<dyn HistoryRepository>,
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
    config: VisibilityExecutorConfig,
}

impl VisibilityExecutor {
    /// Create a new executor with no adapters registered.
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        locks: Arc<dyn LockRepository>,
        originals: Arc<dyn OriginalStatusRepository>,
        history: Arc<dyn HistoryRepository>,
        config: VisibilityExecutorConfig,
    ) -> Self {
        Self { tokens, locks, originals, history, adapters: HashMap::new(), config }
    }

    /// Register a platform adapter.
    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.adapters.insert(adapter.platform(), adapter);
        self
    }

    /// Run one hide or restore pass for one user across all connected
    /// platforms.
    ///
    /// Platform failures never abort the pass for other platforms; they
    /// surface as per-platform outcomes. The returned report has already
    /// been appended to the history.
    #[instrument(skip(self, kind), fields(kind = kind.as_str()))]
    pub async fn run_pass(&self, user_id: &str, kind: PassKind) -> Result<PassReport> {
        let started_at = Utc::now();
        let platforms = self.tokens.list_platforms_for_user(user_id).await?;

        if platforms.is_empty() {
            debug!(user_id, "no connected platforms; pass is a no-op");
        }

        let futures = platforms.into_iter().map(|platform| async move {
            let timeout = self.config.platform_timeout;
            match tokio::time::timeout(timeout, self.run_platform(user_id, kind, platform)).await
            {
                Ok(outcome) => outcome,
                Err(_) => PlatformOutcome::failure(
                    platform,
                    format!("platform pass timed out after {}s", timeout.as_secs()),
                ),
            }
        });

        let outcomes = futures::future::join_all(futures).await;

        let report =
            PassReport { user_id: user_id.to_string(), kind, started_at, platforms: outcomes };

        self.record_history(&report).await;

        info!(
            user_id,
            kind = kind.as_str(),
            affected = report.affected(),
            failed = report.failed(),
            success = report.is_success(),
            "visibility pass finished"
        );

        Ok(report)
    }

    /// One platform's portion of a pass. All failure modes collapse into the
    /// returned outcome.
    async fn run_platform(
        &self,
        user_id: &str,
        kind: PassKind,
        platform: Platform,
    ) -> PlatformOutcome {
        let Some(adapter) = self.adapters.get(&platform) else {
            warn!(user_id, %platform, "token stored for platform with no registered adapter");
            return PlatformOutcome::failure(platform, "no adapter registered");
        };

        let token = match self.fresh_token(user_id, platform, adapter.as_ref()).await {
            Ok(token) => token,
            Err(err) => {
                warn!(user_id, %platform, error = %err, "platform unauthenticated for this pass");
                return PlatformOutcome::failure(platform, err.to_string());
            }
        };

        match kind {
            PassKind::Hide => self.hide_platform(user_id, platform, adapter.as_ref(), &token).await,
            PassKind::Restore => {
                self.restore_platform(user_id, platform, adapter.as_ref(), &token).await
            }
        }
    }

    /// Get the stored token, refreshing it first when it expires within the
    /// configured buffer. A refreshed token is persisted before use.
    async fn fresh_token(
        &self,
        user_id: &str,
        platform: Platform,
        adapter: &dyn PlatformAdapter,
    ) -> Result<PlatformToken> {
        let token = self
            .tokens
            .get(user_id, platform)
            .await?
            .ok_or_else(|| ShomerError::Auth(format!("no token stored for {platform}")))?;

        if !token.expires_within(Utc::now(), self.config.token_refresh_buffer_secs) {
            return Ok(token);
        }

        debug!(user_id, %platform, "access token near expiry; refreshing");
        let refreshed = adapter
            .refresh_token(&token)
            .await
            .map_err(|err| ShomerError::Auth(format!("token refresh failed: {err}")))?;
        self.tokens.save(&refreshed).await?;
        Ok(refreshed)
    }

    /// Hide pass for one platform: capture original state, then flip each
    /// unlocked, still-visible item to the platform's hidden sentinel.
    async fn hide_platform(
        &self,
        user_id: &str,
        platform: Platform,
        adapter: &dyn PlatformAdapter,
        token: &PlatformToken,
    ) -> PlatformOutcome {
        let items = match adapter.list_content(token).await {
            Ok(items) => items,
            Err(err) => {
                error!(user_id, %platform, error = %err, "failed to list content");
                return PlatformOutcome::failure(platform, format!("listing failed: {err}"));
            }
        };

        let hidden = adapter.hidden_visibility();
        let mut outcome = PlatformOutcome {
            platform,
            total: items.len(),
            affected: 0,
            failed: 0,
            skipped_locked: 0,
            error: None,
        };

        for item in &items {
            match self.locks.is_locked(user_id, platform, &item.id).await {
                Ok(true) => {
                    outcome.skipped_locked += 1;
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(user_id, %platform, content_id = %item.id, error = %err, "lock lookup failed");
                    outcome.failed += 1;
                    continue;
                }
            }

            if item.visibility == hidden {
                continue;
            }

            // The original visibility must be durable before the item is
            // mutated; a failed write means the item is left untouched.
            let original = OriginalStatus {
                user_id: user_id.to_string(),
                platform,
                content_id: item.id.clone(),
                original_visibility: item.visibility.clone(),
                recorded_at: Utc::now().timestamp(),
            };
            if let Err(err) = self.originals.record_if_absent(&original).await {
                warn!(user_id, %platform, content_id = %item.id, error = %err, "failed to record original status");
                outcome.failed += 1;
                continue;
            }

            match adapter.set_visibility(token, &item.id, &hidden).await {
                Ok(()) => outcome.affected += 1,
                Err(err) => {
                    // The record stays; restoring an item that was never
                    // hidden just rewrites its current visibility.
                    warn!(user_id, %platform, content_id = %item.id, error = %err, "failed to hide item");
                    outcome.failed += 1;
                }
            }

            tokio::time::sleep(self.config.item_delay).await;
        }

        outcome
    }

    /// Restore pass for one platform: replay each recorded original
    /// visibility, deleting the record on success and retaining it on
    /// failure or while the item is locked.
    async fn restore_platform(
        &self,
        user_id: &str,
        platform: Platform,
        adapter: &dyn PlatformAdapter,
        token: &PlatformToken,
    ) -> PlatformOutcome {
        let records = match self.originals.list_for_user_platform(user_id, platform).await {
            Ok(records) => records,
            Err(err) => {
                error!(user_id, %platform, error = %err, "failed to list original statuses");
                return PlatformOutcome::failure(platform, format!("status lookup failed: {err}"));
            }
        };

        let mut outcome = PlatformOutcome {
            platform,
            total: records.len(),
            affected: 0,
            failed: 0,
            skipped_locked: 0,
            error: None,
        };

        for record in &records {
            match self.locks.is_locked(user_id, platform, &record.content_id).await {
                Ok(true) => {
                    // Item stays hidden; the record is preserved so a future
                    // pass restores it once unlocked.
                    outcome.skipped_locked += 1;
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(user_id, %platform, content_id = %record.content_id, error = %err, "lock lookup failed");
                    outcome.failed += 1;
                    continue;
                }
            }

            match adapter
                .set_visibility(token, &record.content_id, &record.original_visibility)
                .await
            {
                Ok(()) => {
                    outcome.affected += 1;
                    if let Err(err) =
                        self.originals.delete(user_id, platform, &record.content_id).await
                    {
                        // Retained record makes the next pass re-restore the
                        // same value, which is harmless.
                        warn!(user_id, %platform, content_id = %record.content_id, error = %err, "failed to delete restored status");
                    }
                }
                Err(err) => {
                    warn!(user_id, %platform, content_id = %record.content_id, error = %err, "failed to restore item");
                    outcome.failed += 1;
                }
            }

            tokio::time::sleep(self.config.item_delay).await;
        }

        outcome
    }

    /// Append per-platform rows plus the aggregate row. History failures are
    /// logged, never propagated.
    async fn record_history(&self, report: &PassReport) {
        for outcome in &report.platforms {
            let entry = HistoryEntry::for_platform(report, outcome);
            if let Err(err) = self.history.append(&entry).await {
                error!(user_id = %report.user_id, platform = %outcome.platform, error = %err, "failed to append history entry");
            }
        }

        let aggregate = HistoryEntry::aggregate(report);
        if let Err(err) = self.history.append(&aggregate).await {
            error!(user_id = %report.user_id, error = %err, "failed to append aggregate history entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use shomer_domain::{ContentItem, ContentLock, Visibility};

    use super::*;
    use crate::visibility::ports::{
        LockRepository, OriginalStatusRepository, PlatformAdapter, TokenRepository,
    };

    // ------------------------------------------------------------------
    // In-memory test doubles
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct MemTokens {
        tokens: Mutex<HashMap<(String, Platform), PlatformToken>>,
        saves: Mutex<Vec<PlatformToken>>,
    }

    impl MemTokens {
        fn with_token(self, token: PlatformToken) -> Self {
            self.tokens
                .lock()
                .unwrap()
                .insert((token.user_id.clone(), token.platform), token);
            self
        }
    }

    #[async_trait]
    impl TokenRepository for MemTokens {
        async fn get(&self, user_id: &str, platform: Platform) -> Result<Option<PlatformToken>> {
            Ok(self.tokens.lock().unwrap().get(&(user_id.to_string(), platform)).cloned())
        }

        async fn list_platforms_for_user(&self, user_id: &str) -> Result<Vec<Platform>> {
            let mut platforms: Vec<Platform> = self
                .tokens
                .lock()
                .unwrap()
                .keys()
                .filter(|(uid, _)| uid == user_id)
                .map(|(_, p)| *p)
                .collect();
            platforms.sort_by_key(|p| p.as_str());
            Ok(platforms)
        }

        async fn save(&self, token: &PlatformToken) -> Result<()> {
            self.saves.lock().unwrap().push(token.clone());
            self.tokens
                .lock()
                .unwrap()
                .insert((token.user_id.clone(), token.platform), token.clone());
            Ok(())
        }

        async fn remove(&self, user_id: &str, platform: Platform) -> Result<()> {
            self.tokens.lock().unwrap().remove(&(user_id.to_string(), platform));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemLocks {
        locked: Mutex<HashSet<(String, Platform, String)>>,
    }

    impl MemLocks {
        fn lock_item(&self, user_id: &str, platform: Platform, content_id: &str) {
            self.locked.lock().unwrap().insert((
                user_id.to_string(),
                platform,
                content_id.to_string(),
            ));
        }
    }

    #[async_trait]
    impl LockRepository for MemLocks {
        async fn is_locked(
            &self,
            user_id: &str,
            platform: Platform,
            content_id: &str,
        ) -> Result<bool> {
            Ok(self.locked.lock().unwrap().contains(&(
                user_id.to_string(),
                platform,
                content_id.to_string(),
            )))
        }

        async fn set_lock(&self, lock: &ContentLock) -> Result<()> {
            let key = (lock.user_id.clone(), lock.platform, lock.content_id.clone());
            if lock.locked {
                self.locked.lock().unwrap().insert(key);
            } else {
                self.locked.lock().unwrap().remove(&key);
            }
            Ok(())
        }

        async fn list_locks_for_user(&self, _user_id: &str) -> Result<Vec<ContentLock>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MemOriginals {
        records: Mutex<HashMap<(String, Platform, String), OriginalStatus>>,
    }

    impl MemOriginals {
        fn count(&self) -> usize {
            self.records.lock().unwrap().len()
        }

        fn get(&self, user_id: &str, platform: Platform, content_id: &str) -> Option<OriginalStatus> {
            self.records
                .lock()
                .unwrap()
                .get(&(user_id.to_string(), platform, content_id.to_string()))
                .cloned()
        }
    }

    #[async_trait]
    impl OriginalStatusRepository for MemOriginals {
        async fn record_if_absent(&self, status: &OriginalStatus) -> Result<bool> {
            let key =
                (status.user_id.clone(), status.platform, status.content_id.clone());
            let mut records = self.records.lock().unwrap();
            if records.contains_key(&key) {
                return Ok(false);
            }
            records.insert(key, status.clone());
            Ok(true)
        }

        async fn list_for_user_platform(
            &self,
            user_id: &str,
            platform: Platform,
        ) -> Result<Vec<OriginalStatus>> {
            let mut records: Vec<OriginalStatus> = self
                .records
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.user_id == user_id && r.platform == platform)
                .cloned()
                .collect();
            records.sort_by(|a, b| a.content_id.cmp(&b.content_id));
            Ok(records)
        }

        async fn delete(
            &self,
            user_id: &str,
            platform: Platform,
            content_id: &str,
        ) -> Result<()> {
            self.records.lock().unwrap().remove(&(
                user_id.to_string(),
                platform,
                content_id.to_string(),
            ));
            Ok(())
        }

        async fn delete_all_for_user(&self, user_id: &str) -> Result<usize> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|(uid, _, _), _| uid != user_id);
            Ok(before - records.len())
        }
    }

    #[derive(Default)]
    struct MemHistory {
        entries: Mutex<Vec<HistoryEntry>>,
    }

    impl MemHistory {
        fn entries(&self) -> Vec<HistoryEntry> {
            self.entries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HistoryRepository for MemHistory {
        async fn append(&self, entry: &HistoryEntry) -> Result<()> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn list_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
            let mut entries: Vec<HistoryEntry> = self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect();
            entries.reverse();
            entries.truncate(limit);
            Ok(entries)
        }
    }

    /// Scriptable adapter over an in-memory content map.
    struct MockAdapter {
        platform: Platform,
        content: Mutex<HashMap<String, Visibility>>,
        set_calls: Mutex<Vec<(String, Visibility)>>,
        fail_listing: bool,
        fail_set_for: Option<String>,
        fail_refresh: bool,
    }

    impl MockAdapter {
        fn new(platform: Platform, items: &[(&str, &str)]) -> Self {
            Self {
                platform,
                content: Mutex::new(
                    items
                        .iter()
                        .map(|(id, vis)| (id.to_string(), Visibility::new(*vis)))
                        .collect(),
                ),
                set_calls: Mutex::new(Vec::new()),
                fail_listing: false,
                fail_set_for: None,
                fail_refresh: false,
            }
        }

        fn failing_listing(mut self) -> Self {
            self.fail_listing = true;
            self
        }

        fn failing_set_for(mut self, content_id: &str) -> Self {
            self.fail_set_for = Some(content_id.to_string());
            self
        }

        fn failing_refresh(mut self) -> Self {
            self.fail_refresh = true;
            self
        }

        fn set_calls(&self) -> Vec<(String, Visibility)> {
            self.set_calls.lock().unwrap().clone()
        }

        fn visibility_of(&self, content_id: &str) -> Option<Visibility> {
            self.content.lock().unwrap().get(content_id).cloned()
        }
    }

    #[async_trait]
    impl PlatformAdapter for MockAdapter {
        fn platform(&self) -> Platform {
            self.platform
        }

        fn hidden_visibility(&self) -> Visibility {
            Visibility::new("private")
        }

        async fn list_content(&self, _token: &PlatformToken) -> Result<Vec<ContentItem>> {
            if self.fail_listing {
                return Err(ShomerError::Network("simulated listing failure".into()));
            }
            let mut items: Vec<ContentItem> = self
                .content
                .lock()
                .unwrap()
                .iter()
                .map(|(id, vis)| ContentItem { id: id.clone(), visibility: vis.clone() })
                .collect();
            items.sort_by(|a, b| a.id.cmp(&b.id));
            Ok(items)
        }

        async fn set_visibility(
            &self,
            _token: &PlatformToken,
            content_id: &str,
            visibility: &Visibility,
        ) -> Result<()> {
            self.set_calls
                .lock()
                .unwrap()
                .push((content_id.to_string(), visibility.clone()));
            if self.fail_set_for.as_deref() == Some(content_id) {
                return Err(ShomerError::Platform("simulated set failure".into()));
            }
            self.content.lock().unwrap().insert(content_id.to_string(), visibility.clone());
            Ok(())
        }

        async fn refresh_token(&self, token: &PlatformToken) -> Result<PlatformToken> {
            if self.fail_refresh {
                return Err(ShomerError::Auth("simulated refresh failure".into()));
            }
            Ok(PlatformToken {
                access_token: "refreshed".into(),
                expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
                ..token.clone()
            })
        }
    }

    fn token(user_id: &str, platform: Platform) -> PlatformToken {
        PlatformToken {
            user_id: user_id.to_string(),
            platform,
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        }
    }

    struct Fixture {
        tokens: Arc<MemTokens>,
        locks: Arc<MemLocks>,
        originals: Arc<MemOriginals>,
        history: Arc<MemHistory>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tokens: Arc::new(MemTokens::default()),
                locks: Arc::new(MemLocks::default()),
                originals: Arc::new(MemOriginals::default()),
                history: Arc::new(MemHistory::default()),
            }
        }

        fn executor(&self, adapters: Vec<Arc<MockAdapter>>) -> VisibilityExecutor {
            let config = VisibilityExecutorConfig {
                item_delay: Duration::from_millis(1),
                platform_timeout: Duration::from_secs(5),
                token_refresh_buffer_secs: 120,
            };
            let mut executor = VisibilityExecutor::new(
                self.tokens.clone(),
                self.locks.clone(),
                self.originals.clone(),
                self.history.clone(),
                config,
            );
            for adapter in adapters {
                executor = executor.with_adapter(adapter);
            }
            executor
        }
    }

    // ------------------------------------------------------------------
    // Hide pass
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn hide_pass_hides_visible_items_and_records_originals() {
        let fix = Fixture::new();
        fix.tokens.save(&token("u1", Platform::YouTube)).await.unwrap();
        let adapter = Arc::new(MockAdapter::new(
            Platform::YouTube,
            &[("v1", "public"), ("v2", "unlisted"), ("v3", "private")],
        ));
        let executor = fix.executor(vec![adapter.clone()]);

        let report = executor.run_pass("u1", PassKind::Hide).await.unwrap();

        assert_eq!(report.affected(), 2); // v3 already hidden
        assert_eq!(report.failed(), 0);
        assert_eq!(adapter.visibility_of("v1"), Some(Visibility::new("private")));
        assert_eq!(adapter.visibility_of("v2"), Some(Visibility::new("private")));
        assert_eq!(
            fix.originals.get("u1", Platform::YouTube, "v1").unwrap().original_visibility,
            Visibility::new("public")
        );
        assert!(fix.originals.get("u1", Platform::YouTube, "v3").is_none());
    }

    #[tokio::test]
    async fn hide_pass_never_touches_locked_items() {
        let fix = Fixture::new();
        fix.tokens.save(&token("u1", Platform::YouTube)).await.unwrap();
        fix.locks.lock_item("u1", Platform::YouTube, "v1");
        let adapter =
            Arc::new(MockAdapter::new(Platform::YouTube, &[("v1", "public"), ("v2", "public")]));
        let executor = fix.executor(vec![adapter.clone()]);

        let report = executor.run_pass("u1", PassKind::Hide).await.unwrap();

        assert_eq!(report.affected(), 1);
        assert_eq!(report.platforms[0].skipped_locked, 1);
        // v1 was never mutated, and no original status was captured for it.
        assert!(adapter.set_calls().iter().all(|(id, _)| id != "v1"));
        assert!(fix.originals.get("u1", Platform::YouTube, "v1").is_none());
    }

    #[tokio::test]
    async fn per_item_failure_does_not_abort_batch_or_roll_back_original() {
        let fix = Fixture::new();
        fix.tokens.save(&token("u1", Platform::YouTube)).await.unwrap();
        let adapter = Arc::new(
            MockAdapter::new(Platform::YouTube, &[("v1", "public"), ("v2", "public")])
                .failing_set_for("v1"),
        );
        let executor = fix.executor(vec![adapter.clone()]);

        let report = executor.run_pass("u1", PassKind::Hide).await.unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.affected(), 1);
        // OriginalStatus for the failed item is retained.
        assert!(fix.originals.get("u1", Platform::YouTube, "v1").is_some());
        assert_eq!(adapter.visibility_of("v2"), Some(Visibility::new("private")));
    }

    #[tokio::test]
    async fn double_hide_writes_exactly_one_original_record() {
        let fix = Fixture::new();
        fix.tokens.save(&token("u1", Platform::YouTube)).await.unwrap();
        // set fails so the item stays visible and the second hide pass
        // considers it again.
        let adapter = Arc::new(
            MockAdapter::new(Platform::YouTube, &[("v1", "public")]).failing_set_for("v1"),
        );
        let executor = fix.executor(vec![adapter.clone()]);

        executor.run_pass("u1", PassKind::Hide).await.unwrap();
        executor.run_pass("u1", PassKind::Hide).await.unwrap();

        assert_eq!(fix.originals.count(), 1);
        assert_eq!(
            fix.originals.get("u1", Platform::YouTube, "v1").unwrap().original_visibility,
            Visibility::new("public")
        );
    }

    // ------------------------------------------------------------------
    // Restore pass
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn restore_is_idempotent() {
        let fix = Fixture::new();
        fix.tokens.save(&token("u1", Platform::YouTube)).await.unwrap();
        let adapter = Arc::new(MockAdapter::new(Platform::YouTube, &[("v1", "public")]));
        let executor = fix.executor(vec![adapter.clone()]);

        executor.run_pass("u1", PassKind::Hide).await.unwrap();
        assert_eq!(adapter.visibility_of("v1"), Some(Visibility::new("private")));

        let first = executor.run_pass("u1", PassKind::Restore).await.unwrap();
        assert_eq!(first.affected(), 1);
        assert_eq!(adapter.visibility_of("v1"), Some(Visibility::new("public")));
        assert_eq!(fix.originals.count(), 0);

        let second = executor.run_pass("u1", PassKind::Restore).await.unwrap();
        assert_eq!(second.affected(), 0);
        assert_eq!(second.platforms[0].total, 0);
    }

    #[tokio::test]
    async fn restore_skips_locked_items_and_retains_their_records() {
        let fix = Fixture::new();
        fix.tokens.save(&token("u1", Platform::YouTube)).await.unwrap();
        let adapter = Arc::new(MockAdapter::new(Platform::YouTube, &[("v1", "public")]));
        let executor = fix.executor(vec![adapter.clone()]);

        executor.run_pass("u1", PassKind::Hide).await.unwrap();
        fix.locks.lock_item("u1", Platform::YouTube, "v1");

        let report = executor.run_pass("u1", PassKind::Restore).await.unwrap();

        assert_eq!(report.affected(), 0);
        assert_eq!(report.platforms[0].skipped_locked, 1);
        // Record preserved for a future pass once unlocked; item stays hidden.
        assert!(fix.originals.get("u1", Platform::YouTube, "v1").is_some());
        assert_eq!(adapter.visibility_of("v1"), Some(Visibility::new("private")));
    }

    #[tokio::test]
    async fn failed_restore_retains_record_for_retry() {
        let fix = Fixture::new();
        fix.tokens.save(&token("u1", Platform::YouTube)).await.unwrap();
        let hide_adapter = Arc::new(MockAdapter::new(Platform::YouTube, &[("v1", "public")]));
        fix.executor(vec![hide_adapter]).run_pass("u1", PassKind::Hide).await.unwrap();

        let restore_adapter = Arc::new(
            MockAdapter::new(Platform::YouTube, &[("v1", "private")]).failing_set_for("v1"),
        );
        let report = fix
            .executor(vec![restore_adapter])
            .run_pass("u1", PassKind::Restore)
            .await
            .unwrap();

        assert_eq!(report.failed(), 1);
        assert!(fix.originals.get("u1", Platform::YouTube, "v1").is_some());
    }

    // ------------------------------------------------------------------
    // Cross-platform isolation and token handling
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn adapter_failure_on_one_platform_does_not_affect_the_other() {
        let fix = Fixture::new();
        fix.tokens.save(&token("u1", Platform::YouTube)).await.unwrap();
        fix.tokens.save(&token("u1", Platform::Facebook)).await.unwrap();
        let broken =
            Arc::new(MockAdapter::new(Platform::Facebook, &[("p1", "public")]).failing_listing());
        let healthy = Arc::new(MockAdapter::new(Platform::YouTube, &[("v1", "public")]));
        let executor = fix.executor(vec![broken, healthy.clone()]);

        let report = executor.run_pass("u1", PassKind::Hide).await.unwrap();

        let youtube =
            report.platforms.iter().find(|o| o.platform == Platform::YouTube).unwrap();
        let facebook =
            report.platforms.iter().find(|o| o.platform == Platform::Facebook).unwrap();

        assert_eq!(youtube.affected, 1);
        assert!(youtube.error.is_none());
        assert!(facebook.error.is_some());

        // History: one row per platform plus one aggregate, and platform B's
        // row carries no trace of platform A's failure.
        let entries = fix.history.entries();
        assert_eq!(entries.len(), 3);
        let youtube_entry = entries.iter().find(|e| e.platform == "youtube").unwrap();
        assert!(youtube_entry.success);
        assert!(youtube_entry.error.is_none());
        let aggregate = entries.iter().find(|e| e.platform == "automatic").unwrap();
        assert!(!aggregate.success);
    }

    #[tokio::test]
    async fn expiring_token_is_refreshed_and_persisted_before_use() {
        let fix = Fixture::new();
        let mut expiring = token("u1", Platform::YouTube);
        expiring.expires_at = Some(Utc::now() + chrono::Duration::seconds(30));
        fix.tokens.save(&expiring).await.unwrap();
        fix.tokens.saves.lock().unwrap().clear();

        let adapter = Arc::new(MockAdapter::new(Platform::YouTube, &[("v1", "public")]));
        let executor = fix.executor(vec![adapter]);

        let report = executor.run_pass("u1", PassKind::Hide).await.unwrap();

        assert!(report.is_success());
        let saves = fix.tokens.saves.lock().unwrap().clone();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].access_token, "refreshed");
    }

    #[tokio::test]
    async fn refresh_failure_marks_platform_unauthenticated_without_crashing() {
        let fix = Fixture::new();
        let mut expiring = token("u1", Platform::YouTube);
        expiring.expires_at = Some(Utc::now() - chrono::Duration::seconds(5));
        fix.tokens.save(&expiring).await.unwrap();
        fix.tokens.save(&token("u1", Platform::Facebook)).await.unwrap();

        let stale = Arc::new(
            MockAdapter::new(Platform::YouTube, &[("v1", "public")]).failing_refresh(),
        );
        let healthy = Arc::new(MockAdapter::new(Platform::Facebook, &[("p1", "public")]));
        let executor = fix.executor(vec![stale.clone(), healthy]);

        let report = executor.run_pass("u1", PassKind::Hide).await.unwrap();

        let youtube =
            report.platforms.iter().find(|o| o.platform == Platform::YouTube).unwrap();
        assert!(youtube.error.as_deref().unwrap_or("").contains("refresh"));
        assert!(stale.set_calls().is_empty());

        let facebook =
            report.platforms.iter().find(|o| o.platform == Platform::Facebook).unwrap();
        assert_eq!(facebook.affected, 1);
    }

    #[tokio::test]
    async fn pass_with_no_connected_platforms_is_a_noop() {
        let fix = Fixture::new();
        let executor = fix.executor(vec![]);

        let report = executor.run_pass("u1", PassKind::Restore).await.unwrap();

        assert!(report.platforms.is_empty());
        assert!(report.is_success());
        // Only the aggregate history row is written.
        assert_eq!(fix.history.entries().len(), 1);
    }
}
