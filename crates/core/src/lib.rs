//! # Shomer Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Quiet period resolution and offset arithmetic
//! - Port/adapter interfaces (traits)
//! - The visibility executor service
//!
//! ## Architecture Principles
//! - Only depends on `shomer-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod times;
pub mod visibility;

// Re-export specific items to avoid ambiguity
pub use times::offsets::apply_offsets;
pub use times::ports::{ManualOverrideStore, QuietPeriodSource};
pub use times::table::{LocationEntry, LocationTable, ShabbatTimesSource};
pub use visibility::ports::{
    HistoryRepository, LockRepository, OriginalStatusRepository, PlatformAdapter,
    SubscriptionGate, TokenRepository, UserRepository,
};
pub use visibility::service::{VisibilityExecutor, VisibilityExecutorConfig};
