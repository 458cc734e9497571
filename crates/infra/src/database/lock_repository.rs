//! SqlCipher-backed implementation of the LockRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use shomer_core::LockRepository;
use shomer_domain::{ContentLock, Platform, Result};
use tracing::{debug, instrument};

use super::pool::SqlCipherPool;
use crate::errors::InfraError;

/// SqlCipher implementation of LockRepository.
pub struct SqlCipherLockRepository {
    pool: Arc<SqlCipherPool>,
}

impl SqlCipherLockRepository {
    /// Create a new lock repository.
    pub fn new(pool: Arc<SqlCipherPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockRepository for SqlCipherLockRepository {
    #[instrument(skip(self))]
    async fn is_locked(
        &self,
        user_id: &str,
        platform: Platform,
        content_id: &str,
    ) -> Result<bool> {
        let conn = self.pool.get()?;

        let locked: Option<bool> = conn
            .query_row(
                "SELECT locked FROM content_locks
                 WHERE user_id = ?1 AND platform = ?2 AND content_id = ?3",
                params![user_id, platform.as_str(), content_id],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(InfraError::from(other)),
            })?;

        Ok(locked.unwrap_or(false))
    }

    #[instrument(skip(self, lock), fields(user_id = %lock.user_id, platform = %lock.platform, content_id = %lock.content_id, locked = lock.locked))]
    async fn set_lock(&self, lock: &ContentLock) -> Result<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO content_locks (user_id, platform, content_id, locked, reason, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(user_id, platform, content_id) DO UPDATE SET
                 locked = excluded.locked,
                 reason = excluded.reason,
                 updated_at = excluded.updated_at",
            params![
                lock.user_id,
                lock.platform.as_str(),
                lock.content_id,
                lock.locked,
                lock.reason,
                Utc::now().timestamp(),
            ],
        )
        .map_err(InfraError::from)?;

        debug!("lock updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_locks_for_user(&self, user_id: &str) -> Result<Vec<ContentLock>> {
        let conn = self.pool.get()?;

        let mut stmt = conn
            .prepare(
                "SELECT user_id, platform, content_id, locked, reason
                 FROM content_locks
                 WHERE user_id = ?1
                 ORDER BY platform ASC, content_id ASC",
            )
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        Ok(rows
            .into_iter()
            .filter_map(|(user_id, platform_name, content_id, locked, reason)| {
                Platform::parse(&platform_name).map(|platform| ContentLock {
                    user_id,
                    platform,
                    content_id,
                    locked,
                    reason: reason.unwrap_or_default(),
                })
            })
            .collect())
    }
}
