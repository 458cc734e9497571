//! # Shomer API
//!
//! Composition root for the Shomer service.
//!
//! This crate contains:
//! - `AppContext`: the dependency container wiring config, database,
//!   repositories, the visibility executor, and the scheduler
//! - Thin command wrappers (scheduler lifecycle, manual passes, locks,
//!   settings, platform connections, history)
//! - The `shomer` binary entry point

pub mod commands;
pub mod context;

pub use commands::{
    connect_platform, disconnect_platform, get_history, list_content_locks,
    refresh_user_schedule, run_hide_pass, run_restore_pass, scheduler_status, set_content_lock,
    set_manual_override, start_scheduler, stop_scheduler, update_user_settings,
};
pub use context::AppContext;
