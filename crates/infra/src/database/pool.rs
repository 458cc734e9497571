//! SQLCipher connection pool
//!
//! r2d2-based connection pooling for the encrypted SQLite database. Every
//! pooled connection gets the SQLCipher key pragmas plus WAL mode, foreign
//! keys, and a busy timeout applied on open.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use shomer_domain::{Result, ShomerError};
use tracing::{debug, info, instrument, warn};

const CIPHER_COMPATIBILITY: i32 = 4;
const KDF_ITER: i32 = 256_000;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// A connection borrowed from the pool.
pub type SqlCipherConnection = PooledConnection<SqliteConnectionManager>;

/// SQLCipher connection pool.
pub struct SqlCipherPool {
    pool: Pool<SqliteConnectionManager>,
    max_size: u32,
}

impl std::fmt::Debug for SqlCipherPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlCipherPool").field("max_size", &self.max_size).finish()
    }
}

impl SqlCipherPool {
    /// Create a pool over an encrypted database file.
    ///
    /// A test connection is acquired immediately so a wrong key is reported
    /// at startup rather than on first use.
    #[instrument(skip(path, encryption_key), fields(db_path = ?path.as_ref(), pool_size = max_size))]
    pub fn new<P: AsRef<Path>>(
        path: P,
        encryption_key: String,
        max_size: u32,
    ) -> Result<Arc<Self>> {
        let max_size = max_size.max(1);

        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(move |conn| {
            apply_cipher_pragmas(conn, &encryption_key)?;
            apply_connection_pragmas(conn)?;
            Ok(())
        });

        let pool = Pool::builder()
            .max_size(max_size)
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)
            .map_err(classify_pool_error)?;

        // Verify the key actually opens the database.
        let conn = pool.get().map_err(classify_pool_error)?;
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|e| {
                warn!(error = %e, "encryption verification failed");
                ShomerError::from(crate::errors::InfraError::from(e))
            })?;
        drop(conn);
        debug!("encryption verified");

        info!(pool_size = max_size, "sqlcipher pool created");
        Ok(Arc::new(Self { pool, max_size }))
    }

    /// Acquire a connection from the pool.
    pub fn get(&self) -> Result<SqlCipherConnection> {
        self.pool.get().map_err(|e| {
            let err_str = e.to_string().to_lowercase();
            if err_str.contains("timeout") {
                warn!(timeout_secs = CONNECTION_TIMEOUT.as_secs(), "connection acquisition timed out");
                ShomerError::Database(format!(
                    "timed out acquiring connection after {}s",
                    CONNECTION_TIMEOUT.as_secs()
                ))
            } else {
                ShomerError::Database(format!("failed to get connection: {e}"))
            }
        })
    }

    /// Configured maximum pool size.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

fn apply_cipher_pragmas(conn: &Connection, key: &str) -> rusqlite::Result<()> {
    conn.pragma_update(None, "key", key)?;
    conn.pragma_update(None, "cipher_compatibility", CIPHER_COMPATIBILITY)?;
    conn.pragma_update(None, "kdf_iter", KDF_ITER)?;
    Ok(())
}

fn apply_connection_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;\n\
         PRAGMA wal_autocheckpoint=1000;\n\
         PRAGMA synchronous=NORMAL;\n\
         PRAGMA foreign_keys=ON;",
    )?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn classify_pool_error(err: r2d2::Error) -> ShomerError {
    let err_str = err.to_string().to_lowercase();
    if err_str.contains("file is not a database")
        || err_str.contains("file is encrypted")
        || err_str.contains("database disk image is malformed")
        || err_str.contains("notadb")
    {
        ShomerError::Security("SQLCipher key rejected or database not encrypted".into())
    } else {
        ShomerError::Database(format!("failed to create pool: {err}"))
    }
}
