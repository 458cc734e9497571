//! Thin command wrappers over the application context.
//!
//! Each command logs its outcome with structured fields and maps every
//! failure into the domain error type; callers never see panics.

pub mod history;
pub mod locks;
pub mod passes;
pub mod platforms;
pub mod scheduler;
pub mod settings;

pub use history::get_history;
pub use locks::{list_content_locks, set_content_lock};
pub use passes::{run_hide_pass, run_restore_pass};
pub use platforms::{connect_platform, disconnect_platform};
pub use scheduler::{refresh_user_schedule, scheduler_status, start_scheduler, stop_scheduler};
pub use settings::{set_manual_override, update_user_settings};

use std::time::Duration;

use tracing::{info, warn};

/// Log the outcome of a command execution with structured fields.
#[inline]
pub(crate) fn log_command_outcome(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = elapsed.as_millis() as u64;
    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}
