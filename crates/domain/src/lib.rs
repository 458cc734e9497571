//! # Shomer Domain
//!
//! Business domain types and models for Shomer.
//!
//! This crate contains:
//! - Domain data types (UserAccount, QuietPeriod, PlatformToken, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Shomer crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
