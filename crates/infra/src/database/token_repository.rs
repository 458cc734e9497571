//! SqlCipher-backed implementation of the TokenRepository port.
//!
//! Secret material never hits the database in the clear: the access token,
//! refresh token, and expiry are serialized into one JSON payload and
//! encrypted with [`TokenCipher`] before storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use shomer_core::TokenRepository;
use shomer_domain::{Platform, PlatformToken, Result, ShomerError};
use tracing::{debug, instrument, warn};

use super::pool::SqlCipherPool;
use crate::crypto::TokenCipher;
use crate::errors::InfraError;

/// Decrypted shape of the stored payload column.
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
}

/// SqlCipher implementation of TokenRepository.
pub struct SqlCipherTokenRepository {
    pool: Arc<SqlCipherPool>,
    cipher: Arc<TokenCipher>,
}

impl SqlCipherTokenRepository {
    /// Create a new token repository.
    pub fn new(pool: Arc<SqlCipherPool>, cipher: Arc<TokenCipher>) -> Self {
        Self { pool, cipher }
    }

    fn encode_payload(&self, token: &PlatformToken) -> Result<String> {
        let payload = TokenPayload {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at: token.expires_at.map(|dt| dt.timestamp()),
        };
        let serialized = serde_json::to_vec(&payload)
            .map_err(|e| ShomerError::Internal(format!("token payload serialization: {e}")))?;
        self.cipher.encrypt_to_string(&serialized)
    }

    fn decode_payload(
        &self,
        user_id: &str,
        platform: Platform,
        encrypted: &str,
    ) -> Result<PlatformToken> {
        let decrypted = self.cipher.decrypt_from_string(encrypted)?;
        let payload: TokenPayload = serde_json::from_slice(&decrypted)
            .map_err(|e| ShomerError::Internal(format!("token payload deserialization: {e}")))?;

        Ok(PlatformToken {
            user_id: user_id.to_string(),
            platform,
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_at: payload.expires_at.and_then(parse_epoch),
        })
    }
}

fn parse_epoch(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

#[async_trait]
impl TokenRepository for SqlCipherTokenRepository {
    #[instrument(skip(self))]
    async fn get(&self, user_id: &str, platform: Platform) -> Result<Option<PlatformToken>> {
        let conn = self.pool.get()?;

        let row: Option<String> = conn
            .query_row(
                "SELECT payload FROM platform_tokens WHERE user_id = ?1 AND platform = ?2",
                params![user_id, platform.as_str()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(InfraError::from(other)),
            })?;

        match row {
            Some(encrypted) => {
                let token = self.decode_payload(user_id, platform, &encrypted)?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn list_platforms_for_user(&self, user_id: &str) -> Result<Vec<Platform>> {
        let conn = self.pool.get()?;

        let mut stmt = conn
            .prepare(
                "SELECT platform FROM platform_tokens WHERE user_id = ?1 ORDER BY platform ASC",
            )
            .map_err(InfraError::from)?;

        let names = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(InfraError::from)?;

        let mut platforms = Vec::with_capacity(names.len());
        for name in names {
            match Platform::parse(&name) {
                Some(platform) => platforms.push(platform),
                // Tolerate rows from a newer schema version.
                None => warn!(user_id, platform = %name, "skipping unknown platform in token table"),
            }
        }

        Ok(platforms)
    }

    #[instrument(skip(self, token), fields(user_id = %token.user_id, platform = %token.platform))]
    async fn save(&self, token: &PlatformToken) -> Result<()> {
        let payload = self.encode_payload(token)?;
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO platform_tokens (user_id, platform, payload, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, platform) DO UPDATE SET
                 payload = excluded.payload,
                 updated_at = excluded.updated_at",
            params![token.user_id, token.platform.as_str(), payload, Utc::now().timestamp()],
        )
        .map_err(InfraError::from)?;

        debug!(user_id = %token.user_id, platform = %token.platform, "token saved");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, user_id: &str, platform: Platform) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM platform_tokens WHERE user_id = ?1 AND platform = ?2",
            params![user_id, platform.as_str()],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::database::manager::DbManager;

    const TEST_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn setup() -> (SqlCipherTokenRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let manager = DbManager::new(&db_path, 2, Some(TEST_KEY)).unwrap();
        manager.run_migrations().unwrap();

        let cipher = Arc::new(TokenCipher::new(TokenCipher::generate_key()).unwrap());
        (SqlCipherTokenRepository::new(Arc::clone(manager.pool()), cipher), temp_dir)
    }

    fn token(user_id: &str, platform: Platform) -> PlatformToken {
        PlatformToken {
            user_id: user_id.to_string(),
            platform,
            access_token: "access-secret".into(),
            refresh_token: Some("refresh-secret".into()),
            expires_at: parse_epoch(1_900_000_000),
        }
    }

    #[tokio::test]
    async fn save_and_get_round_trip() {
        let (repo, _temp) = setup();

        repo.save(&token("u1", Platform::YouTube)).await.unwrap();
        let loaded = repo.get("u1", Platform::YouTube).await.unwrap().unwrap();

        assert_eq!(loaded.access_token, "access-secret");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh-secret"));
        assert_eq!(loaded.expires_at, parse_epoch(1_900_000_000));
    }

    #[tokio::test]
    async fn get_missing_token_is_none() {
        let (repo, _temp) = setup();
        assert!(repo.get("u1", Platform::Facebook).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_overwrites_existing_token() {
        let (repo, _temp) = setup();

        repo.save(&token("u1", Platform::YouTube)).await.unwrap();
        let mut updated = token("u1", Platform::YouTube);
        updated.access_token = "rotated".into();
        repo.save(&updated).await.unwrap();

        let loaded = repo.get("u1", Platform::YouTube).await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "rotated");
    }

    #[tokio::test]
    async fn list_platforms_is_scoped_to_user() {
        let (repo, _temp) = setup();

        repo.save(&token("u1", Platform::YouTube)).await.unwrap();
        repo.save(&token("u1", Platform::Facebook)).await.unwrap();
        repo.save(&token("u2", Platform::YouTube)).await.unwrap();

        let platforms = repo.list_platforms_for_user("u1").await.unwrap();
        assert_eq!(platforms, vec![Platform::Facebook, Platform::YouTube]);
    }

    #[tokio::test]
    async fn remove_deletes_only_target_pair() {
        let (repo, _temp) = setup();

        repo.save(&token("u1", Platform::YouTube)).await.unwrap();
        repo.save(&token("u1", Platform::Facebook)).await.unwrap();
        repo.remove("u1", Platform::YouTube).await.unwrap();

        assert!(repo.get("u1", Platform::YouTube).await.unwrap().is_none());
        assert!(repo.get("u1", Platform::Facebook).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn stored_payload_is_not_plaintext() {
        let (repo, _temp) = setup();
        repo.save(&token("u1", Platform::YouTube)).await.unwrap();

        let conn = repo.pool.get().unwrap();
        let payload: String = conn
            .query_row(
                "SELECT payload FROM platform_tokens WHERE user_id = 'u1'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert!(!payload.contains("access-secret"));
        assert!(!payload.contains("refresh-secret"));
    }
}
