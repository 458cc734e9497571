//! SQLCipher-backed persistence layer.

pub mod history_repository;
pub mod lock_repository;
pub mod manager;
pub mod original_status_repository;
pub mod pool;
pub mod token_repository;
pub mod user_repository;

pub use history_repository::SqlCipherHistoryRepository;
pub use lock_repository::SqlCipherLockRepository;
pub use manager::DbManager;
pub use original_status_repository::SqlCipherOriginalStatusRepository;
pub use pool::{SqlCipherConnection, SqlCipherPool};
pub use token_repository::SqlCipherTokenRepository;
pub use user_repository::SqlCipherUserRepository;
