//! SqlCipher-backed implementation of the UserRepository port.
//!
//! Also implements [`ManualOverrideStore`], since overrides live in a sibling
//! table keyed by user id.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Row};
use shomer_core::{ManualOverrideStore, UserRepository};
use shomer_domain::{
    HideOffset, ManualOverride, RestoreOffset, Result, ScheduleMode, ShomerError,
    SubscriptionTier, UserAccount,
};
use tracing::{debug, instrument};

use super::pool::SqlCipherPool;
use crate::errors::InfraError;

const USER_COLUMNS: &str = "id, email, tier, schedule_mode, location_id, hide_offset, \
                            restore_offset, automation_enabled, created_at, updated_at";

/// SqlCipher implementation of UserRepository and ManualOverrideStore.
pub struct SqlCipherUserRepository {
    pool: Arc<SqlCipherPool>,
}

impl SqlCipherUserRepository {
    /// Create a new user repository.
    pub fn new(pool: Arc<SqlCipherPool>) -> Self {
        Self { pool }
    }
}

/// Raw column values before enum resolution.
struct UserRow {
    id: String,
    email: String,
    tier: String,
    schedule_mode: String,
    location_id: Option<String>,
    hide_offset: String,
    restore_offset: String,
    automation_enabled: bool,
    created_at: i64,
    updated_at: i64,
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        tier: row.get(2)?,
        schedule_mode: row.get(3)?,
        location_id: row.get(4)?,
        hide_offset: row.get(5)?,
        restore_offset: row.get(6)?,
        automation_enabled: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn resolve_user(raw: UserRow) -> Result<UserAccount> {
    let tier = SubscriptionTier::parse(&raw.tier)
        .ok_or_else(|| ShomerError::Database(format!("unknown subscription tier: {}", raw.tier)))?;
    let schedule_mode = match raw.schedule_mode.as_str() {
        "manual" => ScheduleMode::Manual,
        "location" => {
            let location = raw.location_id.ok_or_else(|| {
                ShomerError::Database(format!("user {} has no location set", raw.id))
            })?;
            ScheduleMode::Location(location)
        }
        other => return Err(ShomerError::Database(format!("unknown schedule mode: {other}"))),
    };
    let hide_offset = HideOffset::parse(&raw.hide_offset)
        .ok_or_else(|| ShomerError::Database(format!("unknown hide offset: {}", raw.hide_offset)))?;
    let restore_offset = RestoreOffset::parse(&raw.restore_offset).ok_or_else(|| {
        ShomerError::Database(format!("unknown restore offset: {}", raw.restore_offset))
    })?;

    Ok(UserAccount {
        id: raw.id,
        email: raw.email,
        tier,
        schedule_mode,
        hide_offset,
        restore_offset,
        automation_enabled: raw.automation_enabled,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

fn schedule_mode_columns(mode: &ScheduleMode) -> (&'static str, Option<&str>) {
    match mode {
        ScheduleMode::Manual => ("manual", None),
        ScheduleMode::Location(location) => ("location", Some(location.as_str())),
    }
}

fn parse_epoch(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[async_trait]
impl UserRepository for SqlCipherUserRepository {
    #[instrument(skip(self))]
    async fn find(&self, user_id: &str) -> Result<Option<UserAccount>> {
        let conn = self.pool.get()?;

        let raw = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![user_id],
                row_to_user,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(InfraError::from(other)),
            })?;

        raw.map(resolve_user).transpose()
    }

    #[instrument(skip(self))]
    async fn list_automation_candidates(&self) -> Result<Vec<UserAccount>> {
        let conn = self.pool.get()?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE automation_enabled = 1 ORDER BY id ASC"
            ))
            .map_err(InfraError::from)?;

        let raw = stmt
            .query_map([], row_to_user)
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        raw.into_iter().map(resolve_user).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn upsert(&self, user: &UserAccount) -> Result<()> {
        let conn = self.pool.get()?;
        let (mode, location_id) = schedule_mode_columns(&user.schedule_mode);

        conn.execute(
            "INSERT INTO users
                 (id, email, tier, schedule_mode, location_id, hide_offset, restore_offset,
                  automation_enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                 email = excluded.email,
                 tier = excluded.tier,
                 schedule_mode = excluded.schedule_mode,
                 location_id = excluded.location_id,
                 hide_offset = excluded.hide_offset,
                 restore_offset = excluded.restore_offset,
                 automation_enabled = excluded.automation_enabled,
                 updated_at = excluded.updated_at",
            params![
                user.id,
                user.email,
                user.tier.as_str(),
                mode,
                location_id,
                user.hide_offset.as_str(),
                user.restore_offset.as_str(),
                user.automation_enabled,
                user.created_at,
                user.updated_at,
            ],
        )
        .map_err(InfraError::from)?;

        debug!(user_id = %user.id, "user upserted");
        Ok(())
    }

    #[instrument(skip(self, over))]
    async fn set_override(&self, user_id: &str, over: &ManualOverride) -> Result<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO manual_overrides (user_id, entry_ts, exit_ts, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                 entry_ts = excluded.entry_ts,
                 exit_ts = excluded.exit_ts,
                 updated_at = excluded.updated_at",
            params![
                user_id,
                over.entry.map(|dt| dt.timestamp()),
                over.exit.map(|dt| dt.timestamp()),
                Utc::now().timestamp(),
            ],
        )
        .map_err(InfraError::from)?;

        Ok(())
    }
}

#[async_trait]
impl ManualOverrideStore for SqlCipherUserRepository {
    #[instrument(skip(self))]
    async fn get_override(&self, user_id: &str) -> Result<Option<ManualOverride>> {
        let conn = self.pool.get()?;

        let row: Option<(Option<i64>, Option<i64>)> = conn
            .query_row(
                "SELECT entry_ts, exit_ts FROM manual_overrides WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(InfraError::from(other)),
            })?;

        Ok(row.map(|(entry, exit)| ManualOverride {
            entry: entry.and_then(parse_epoch),
            exit: exit.and_then(parse_epoch),
        }))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::database::manager::DbManager;

    const TEST_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn setup() -> (SqlCipherUserRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let manager = DbManager::new(&db_path, 2, Some(TEST_KEY)).unwrap();
        manager.run_migrations().unwrap();
        (SqlCipherUserRepository::new(Arc::clone(manager.pool())), temp_dir)
    }

    fn user(id: &str, automation_enabled: bool) -> UserAccount {
        UserAccount {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            tier: SubscriptionTier::Premium,
            schedule_mode: ScheduleMode::Location("jerusalem".into()),
            hide_offset: HideOffset::Before30Min,
            restore_offset: RestoreOffset::After30Min,
            automation_enabled,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn upsert_and_find_round_trip() {
        let (repo, _temp) = setup();

        repo.upsert(&user("u1", true)).await.unwrap();
        let loaded = repo.find("u1").await.unwrap().unwrap();

        assert_eq!(loaded.email, "u1@example.com");
        assert_eq!(loaded.tier, SubscriptionTier::Premium);
        assert_eq!(loaded.schedule_mode, ScheduleMode::Location("jerusalem".into()));
        assert_eq!(loaded.hide_offset, HideOffset::Before30Min);
        assert_eq!(loaded.restore_offset, RestoreOffset::After30Min);
        assert!(loaded.automation_enabled);
    }

    #[tokio::test]
    async fn find_missing_user_is_none() {
        let (repo, _temp) = setup();
        assert!(repo.find("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_updates_existing_user() {
        let (repo, _temp) = setup();

        repo.upsert(&user("u1", true)).await.unwrap();

        let mut updated = user("u1", false);
        updated.schedule_mode = ScheduleMode::Manual;
        updated.hide_offset = HideOffset::Before1Hour;
        repo.upsert(&updated).await.unwrap();

        let loaded = repo.find("u1").await.unwrap().unwrap();
        assert_eq!(loaded.schedule_mode, ScheduleMode::Manual);
        assert_eq!(loaded.hide_offset, HideOffset::Before1Hour);
        assert!(!loaded.automation_enabled);
    }

    #[tokio::test]
    async fn candidates_are_limited_to_automation_enabled() {
        let (repo, _temp) = setup();

        repo.upsert(&user("u1", true)).await.unwrap();
        repo.upsert(&user("u2", false)).await.unwrap();
        repo.upsert(&user("u3", true)).await.unwrap();

        let candidates = repo.list_automation_candidates().await.unwrap();
        let ids: Vec<&str> = candidates.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u3"]);
    }

    #[tokio::test]
    async fn override_round_trip() {
        let (repo, _temp) = setup();
        repo.upsert(&user("u1", true)).await.unwrap();

        assert!(repo.get_override("u1").await.unwrap().is_none());

        let entry = parse_epoch(1_750_000_000);
        let exit = parse_epoch(1_750_090_000);
        repo.set_override("u1", &ManualOverride { entry, exit }).await.unwrap();

        let stored = repo.get_override("u1").await.unwrap().unwrap();
        assert_eq!(stored.entry, entry);
        assert_eq!(stored.exit, exit);
    }

    #[tokio::test]
    async fn partial_override_is_preserved() {
        let (repo, _temp) = setup();
        repo.upsert(&user("u1", true)).await.unwrap();

        let entry = parse_epoch(1_750_000_000);
        repo.set_override("u1", &ManualOverride { entry, exit: None }).await.unwrap();

        let stored = repo.get_override("u1").await.unwrap().unwrap();
        assert_eq!(stored.entry, entry);
        assert!(stored.exit.is_none());
    }
}
