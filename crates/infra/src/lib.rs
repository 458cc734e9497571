//! # Shomer Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite/SQLCipher)
//! - Token encryption at rest
//! - Platform API adapters (YouTube)
//! - The Shabbat scheduler (weekly sweep plus one-shot timers)
//!
//! ## Architecture
//! - Implements traits defined in `shomer-core`
//! - Depends on `shomer-domain` and `shomer-core`
//! - Contains all "impure" code (I/O, HTTP, clocks)

pub mod config;
pub mod crypto;
pub mod database;
pub mod errors;
pub mod gate;
pub mod platforms;
pub mod scheduling;

pub use crypto::TokenCipher;
pub use database::{
    DbManager, SqlCipherHistoryRepository, SqlCipherLockRepository,
    SqlCipherOriginalStatusRepository, SqlCipherPool, SqlCipherTokenRepository,
    SqlCipherUserRepository,
};
pub use errors::InfraError;
pub use gate::TierGate;
pub use platforms::youtube::{YouTubeAdapter, YouTubeAdapterConfig};
pub use scheduling::{PassRunner, SchedulerError, SchedulerResult, ShabbatScheduler};
