//! Application context - dependency injection container

use std::sync::Arc;

use shomer_core::{
    HistoryRepository, LocationTable, LockRepository, ManualOverrideStore,
    OriginalStatusRepository, ShabbatTimesSource, TokenRepository, UserRepository,
    VisibilityExecutor, VisibilityExecutorConfig,
};
use shomer_domain::{Config, Result, ShomerError};
use shomer_infra::scheduling::PassRunner;
use shomer_infra::{
    DbManager, ShabbatScheduler, SqlCipherHistoryRepository, SqlCipherLockRepository,
    SqlCipherOriginalStatusRepository, SqlCipherTokenRepository, SqlCipherUserRepository,
    TierGate, TokenCipher, YouTubeAdapter, YouTubeAdapterConfig,
};
use tokio::sync::Mutex;
use tracing::info;

/// Application context - holds all services and dependencies.
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub users: Arc<SqlCipherUserRepository>,
    pub tokens: Arc<SqlCipherTokenRepository>,
    pub locks: Arc<SqlCipherLockRepository>,
    pub originals: Arc<SqlCipherOriginalStatusRepository>,
    pub history: Arc<SqlCipherHistoryRepository>,
    pub executor: Arc<VisibilityExecutor>,
    /// Scheduler lifecycle methods take `&mut self`.
    pub scheduler: Mutex<ShabbatScheduler>,
}

impl AppContext {
    /// Wire the full dependency graph from configuration.
    ///
    /// Opens (and migrates) the encrypted database, builds the repositories
    /// and the token cipher, registers the YouTube adapter on the executor,
    /// and constructs the scheduler without starting it.
    pub async fn new(config: Config, youtube: YouTubeAdapterConfig) -> Result<Arc<Self>> {
        let db = Arc::new(DbManager::new(
            &config.database.path,
            config.database.pool_size,
            config.database.encryption_key.as_deref(),
        )?);
        db.run_migrations()?;

        let cipher_key = config.database.token_cipher_key.as_deref().ok_or_else(|| {
            ShomerError::Security("token cipher key not provided in configuration".into())
        })?;
        let cipher = Arc::new(TokenCipher::from_hex(cipher_key)?);

        let pool = db.pool();
        let users = Arc::new(SqlCipherUserRepository::new(Arc::clone(&pool)));
        let tokens = Arc::new(SqlCipherTokenRepository::new(Arc::clone(&pool), cipher));
        let locks = Arc::new(SqlCipherLockRepository::new(Arc::clone(&pool)));
        let originals = Arc::new(SqlCipherOriginalStatusRepository::new(Arc::clone(&pool)));
        let history = Arc::new(SqlCipherHistoryRepository::new(Arc::clone(&pool)));

        let tokens_port: Arc<dyn TokenRepository> = tokens.clone();
        let locks_port: Arc<dyn LockRepository> = locks.clone();
        let originals_port: Arc<dyn OriginalStatusRepository> = originals.clone();
        let history_port: Arc<dyn HistoryRepository> = history.clone();
        let executor = Arc::new(
            VisibilityExecutor::new(
                tokens_port,
                locks_port,
                originals_port,
                history_port,
                VisibilityExecutorConfig::from(&config.executor),
            )
            .with_adapter(Arc::new(YouTubeAdapter::new(youtube)?)),
        );

        let overrides: Arc<dyn ManualOverrideStore> = users.clone();
        let source = Arc::new(ShabbatTimesSource::new(LocationTable::builtin(), overrides));

        let users_port: Arc<dyn UserRepository> = users.clone();
        let runner: Arc<dyn PassRunner> = executor.clone();
        let scheduler = ShabbatScheduler::new(
            users_port,
            Arc::new(TierGate),
            source,
            runner,
            config.scheduler.clone(),
        )
        .await?;

        info!(db_path = %config.database.path, "application context initialised");

        Ok(Arc::new(Self {
            config,
            db,
            users,
            tokens,
            locks,
            originals,
            history,
            executor,
            scheduler: Mutex::new(scheduler),
        }))
    }
}
