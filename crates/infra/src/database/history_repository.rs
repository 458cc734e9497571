//! SqlCipher-backed implementation of the HistoryRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::params;
use shomer_core::HistoryRepository;
use shomer_domain::{HistoryEntry, PassKind, Result};
use tracing::{instrument, warn};

use super::pool::SqlCipherPool;
use crate::errors::InfraError;

/// SqlCipher implementation of HistoryRepository.
pub struct SqlCipherHistoryRepository {
    pool: Arc<SqlCipherPool>,
}

impl SqlCipherHistoryRepository {
    /// Create a new history repository.
    pub fn new(pool: Arc<SqlCipherPool>) -> Self {
        Self { pool }
    }
}

fn parse_action(value: &str) -> Option<PassKind> {
    match value {
        "hide" => Some(PassKind::Hide),
        "restore" => Some(PassKind::Restore),
        _ => None,
    }
}

#[async_trait]
impl HistoryRepository for SqlCipherHistoryRepository {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id, action = entry.action.as_str(), platform = %entry.platform))]
    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO history_entries
                 (id, user_id, timestamp, action, platform, affected, failed, success, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.id,
                entry.user_id,
                entry.timestamp,
                entry.action.as_str(),
                entry.platform,
                entry.affected,
                entry.failed,
                entry.success,
                entry.error,
            ],
        )
        .map_err(InfraError::from)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let conn = self.pool.get()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, timestamp, action, platform, affected, failed, success, error
                 FROM history_entries
                 WHERE user_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, bool>(7)?,
                    row.get::<_, Option<String>>(8)?,
                ))
            })
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        let entries = rows
            .into_iter()
            .filter_map(
                |(id, user_id, timestamp, action, platform, affected, failed, success, error)| {
                    match parse_action(&action) {
                        Some(action) => Some(HistoryEntry {
                            id,
                            user_id,
                            timestamp,
                            action,
                            platform,
                            affected,
                            failed,
                            success,
                            error,
                        }),
                        None => {
                            warn!(id, action = %action, "skipping history row with unknown action");
                            None
                        }
                    }
                },
            )
            .collect();

        Ok(entries)
    }
}
