//! One-shot deadline timers.
//!
//! Each armed hide or restore job is a spawned task that sleeps until an
//! absolute UTC instant and then runs its action once. Cancellation is
//! cooperative through a [`CancellationToken`]; a fired or cancelled timer
//! never runs its action twice.

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Handle to a spawned one-shot timer task.
#[derive(Debug)]
pub struct OneShotTimer {
    deadline: DateTime<Utc>,
    handle: JoinHandle<()>,
}

impl OneShotTimer {
    /// Spawn a timer that runs `action` once at `deadline`.
    ///
    /// A deadline that is already in the past fires immediately. The timer
    /// races the sleep against `cancel` and exits without running the action
    /// when cancelled first.
    pub fn spawn<F, Fut>(deadline: DateTime<Utc>, cancel: CancellationToken, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let handle = tokio::spawn(async move {
            let remaining = (deadline - Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(%deadline, "one-shot timer cancelled before firing");
                }
                _ = tokio::time::sleep(remaining) => {
                    debug!(%deadline, "one-shot timer fired");
                    action().await;
                }
            }
        });

        Self { deadline, handle }
    }

    /// The absolute instant this timer fires at.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// True while the timer task has neither fired nor been cancelled.
    pub fn is_armed(&self) -> bool {
        !self.handle.is_finished()
    }
}
