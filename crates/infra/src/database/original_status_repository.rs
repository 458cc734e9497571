//! SqlCipher-backed implementation of the OriginalStatusRepository port.
//!
//! The first hide pass that touches an item wins: INSERT OR IGNORE keeps the
//! visibility the item had before automation first hid it, even when hide
//! passes overlap or repeat.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::params;
use shomer_core::OriginalStatusRepository;
use shomer_domain::{OriginalStatus, Platform, Result, Visibility};
use tracing::{debug, instrument};

use super::pool::SqlCipherPool;
use crate::errors::InfraError;

/// SqlCipher implementation of OriginalStatusRepository.
pub struct SqlCipherOriginalStatusRepository {
    pool: Arc<SqlCipherPool>,
}

impl SqlCipherOriginalStatusRepository {
    /// Create a new original status repository.
    pub fn new(pool: Arc<SqlCipherPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OriginalStatusRepository for SqlCipherOriginalStatusRepository {
    #[instrument(skip(self, status), fields(user_id = %status.user_id, platform = %status.platform, content_id = %status.content_id))]
    async fn record_if_absent(&self, status: &OriginalStatus) -> Result<bool> {
        let conn = self.pool.get()?;

        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO original_statuses
                     (user_id, platform, content_id, original_visibility, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    status.user_id,
                    status.platform.as_str(),
                    status.content_id,
                    status.original_visibility.as_str(),
                    status.recorded_at,
                ],
            )
            .map_err(InfraError::from)?;

        debug!(inserted = inserted > 0, "original status recorded");
        Ok(inserted > 0)
    }

    #[instrument(skip(self))]
    async fn list_for_user_platform(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Vec<OriginalStatus>> {
        let conn = self.pool.get()?;

        let mut stmt = conn
            .prepare(
                "SELECT content_id, original_visibility, recorded_at
                 FROM original_statuses
                 WHERE user_id = ?1 AND platform = ?2
                 ORDER BY content_id ASC",
            )
            .map_err(InfraError::from)?;

        let records = stmt
            .query_map(params![user_id, platform.as_str()], |row| {
                Ok(OriginalStatus {
                    user_id: user_id.to_string(),
                    platform,
                    content_id: row.get(0)?,
                    original_visibility: Visibility::new(row.get::<_, String>(1)?),
                    recorded_at: row.get(2)?,
                })
            })
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        Ok(records)
    }

    #[instrument(skip(self))]
    async fn delete(&self, user_id: &str, platform: Platform, content_id: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM original_statuses
             WHERE user_id = ?1 AND platform = ?2 AND content_id = ?3",
            params![user_id, platform.as_str(), content_id],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all_for_user(&self, user_id: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let deleted = conn
            .execute("DELETE FROM original_statuses WHERE user_id = ?1", params![user_id])
            .map_err(InfraError::from)?;
        Ok(deleted)
    }
}
