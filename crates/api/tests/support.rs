use std::sync::Arc;

use shomer_api::AppContext;
use shomer_domain::{
    Config, DatabaseConfig, ExecutorConfig, HideOffset, RestoreOffset, ScheduleMode,
    SchedulerConfig, SubscriptionTier, UserAccount,
};
use shomer_infra::YouTubeAdapterConfig;
use tempfile::TempDir;

const TEST_DB_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const TEST_CIPHER_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// Shared context for integration tests that exercise the command layer.
pub struct TestContext {
    pub ctx: Arc<AppContext>,
    /// Keep temporary directory alive for the lifetime of the context.
    _temp_dir: TempDir,
}

/// Create a context backed by a fresh encrypted database.
pub async fn setup_test_context() -> TestContext {
    let temp_dir = TempDir::new().expect("failed to create temporary database directory");
    let db_path = temp_dir.path().join("shomer.db");

    let config = Config {
        database: DatabaseConfig {
            path: db_path.to_string_lossy().into_owned(),
            pool_size: 4,
            encryption_key: Some(TEST_DB_KEY.to_string()),
            token_cipher_key: Some(TEST_CIPHER_KEY.to_string()),
        },
        scheduler: SchedulerConfig::default(),
        executor: ExecutorConfig { item_delay_ms: 0, ..ExecutorConfig::default() },
    };

    let ctx = AppContext::new(config, YouTubeAdapterConfig::new("test-cid", "test-secret"))
        .await
        .expect("failed to initialise application context");

    TestContext { ctx, _temp_dir: temp_dir }
}

#[allow(dead_code)]
pub fn premium_user(id: &str) -> UserAccount {
    UserAccount {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        tier: SubscriptionTier::Premium,
        schedule_mode: ScheduleMode::Manual,
        hide_offset: HideOffset::AtEntry,
        restore_offset: RestoreOffset::AtExit,
        automation_enabled: true,
        created_at: 0,
        updated_at: 0,
    }
}
