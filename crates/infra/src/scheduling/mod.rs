//! Scheduling infrastructure: weekly sweep plus one-shot visibility timers.

pub mod error;
pub mod oneshot;
pub mod shabbat_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use oneshot::OneShotTimer;
pub use shabbat_scheduler::{PassRunner, ShabbatScheduler};
