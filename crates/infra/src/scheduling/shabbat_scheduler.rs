//! Weekly Shabbat scheduler with explicit lifecycle management.
//!
//! One recurring cron job (the weekly sweep) recomputes every eligible
//! user's next quiet period and arms one-shot hide/restore timers at the
//! offset-adjusted instants. An additional sweep runs immediately on start so
//! a process restarted mid-week recovers its timers. Join handles are
//! tracked, cancellation is explicit, and scheduler-level async operations
//! are wrapped in timeouts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use shomer_core::{
    apply_offsets, QuietPeriodSource, SubscriptionGate, UserRepository, VisibilityExecutor,
};
use shomer_domain::{
    ArmedJobInfo, PassKind, PassReport, Result, SchedulerConfig, SchedulerStatus, ShomerError,
    UserAccount,
};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::error::{SchedulerError, SchedulerResult};
use super::oneshot::OneShotTimer;

const START_TIMEOUT: Duration = Duration::from_secs(5);
const STOP_TIMEOUT: Duration = Duration::from_secs(5);
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for triggering a visibility pass.
///
/// The scheduler only needs "run a pass for this user"; keeping the seam
/// narrow lets tests observe firings without a full executor.
#[async_trait]
pub trait PassRunner: Send + Sync {
    /// Run one hide or restore pass for one user.
    async fn run_pass(&self, user_id: &str, kind: PassKind) -> Result<PassReport>;
}

#[async_trait]
impl PassRunner for VisibilityExecutor {
    async fn run_pass(&self, user_id: &str, kind: PassKind) -> Result<PassReport> {
        VisibilityExecutor::run_pass(self, user_id, kind).await
    }
}

/// Armed timers for one user.
struct UserJobs {
    cancel: CancellationToken,
    hide: Option<OneShotTimer>,
    restore: Option<OneShotTimer>,
}

impl UserJobs {
    fn info(&self, user_id: &str) -> ArmedJobInfo {
        ArmedJobInfo {
            user_id: user_id.to_string(),
            hide_at: self.hide.as_ref().map(OneShotTimer::deadline),
            restore_at: self.restore.as_ref().map(OneShotTimer::deadline),
        }
    }

    fn is_empty(&self) -> bool {
        self.hide.is_none() && self.restore.is_none()
    }
}

/// Shared state the sweep job and the public API both operate on.
struct SweepContext {
    users: Arc<dyn UserRepository>,
    gate: Arc<dyn SubscriptionGate>,
    source: Arc<dyn QuietPeriodSource>,
    runner: Arc<dyn PassRunner>,
    jobs: Mutex<HashMap<String, UserJobs>>,
    // Parent token for all armed timers; replaced on each start().
    cancel: std::sync::Mutex<CancellationToken>,
}

impl SweepContext {
    fn parent_token(&self) -> CancellationToken {
        match self.cancel.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn reset_parent_token(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        match self.cancel.lock() {
            Ok(mut guard) => *guard = fresh.clone(),
            Err(mut poisoned) => **poisoned.get_mut() = fresh.clone(),
        }
        fresh
    }

    /// Recompute and re-arm timers for every automation candidate.
    ///
    /// One user's failure never prevents the rest of the sweep.
    async fn sweep(self: &Arc<Self>) {
        let candidates = match self.users.list_automation_candidates().await {
            Ok(candidates) => candidates,
            Err(err) => {
                error!(error = %err, "sweep aborted: failed to list candidates");
                return;
            }
        };

        info!(count = candidates.len(), "running scheduling sweep");

        for user in &candidates {
            if let Err(err) = self.schedule_user(user).await {
                warn!(user_id = %user.id, error = %err, "failed to schedule user");
            }
        }
    }

    /// Re-arm timers for one user, replacing whatever was armed before.
    async fn schedule_user(self: &Arc<Self>, user: &UserAccount) -> Result<()> {
        self.disarm(&user.id).await;

        // A stopped scheduler never arms: timers born under a cancelled
        // parent would die without firing but still show up in status.
        let parent = self.parent_token();
        if parent.is_cancelled() {
            debug!(user_id = %user.id, "scheduler not running; leaving user disarmed");
            return Ok(());
        }

        if !self.gate.is_eligible(user) {
            debug!(user_id = %user.id, "user not eligible for automation");
            return Ok(());
        }

        let period = self.source.quiet_period(user).await?;
        let (hide_at, restore_at) = apply_offsets(&period, user.hide_offset, user.restore_offset);
        let now = Utc::now();

        // An instant already in the past is simply not armed: a restart in
        // the middle of a quiet period still arms the restore side.
        if restore_at <= now {
            debug!(user_id = %user.id, %restore_at, "quiet period fully in the past; nothing to arm");
            return Ok(());
        }

        let cancel = parent.child_token();

        let hide = (hide_at > now).then(|| {
            let context = Arc::clone(self);
            let user_id = user.id.clone();
            OneShotTimer::spawn(hide_at, cancel.clone(), move || async move {
                context.fire(&user_id, PassKind::Hide).await;
            })
        });

        let context = Arc::clone(self);
        let user_id = user.id.clone();
        let restore = Some(OneShotTimer::spawn(restore_at, cancel.clone(), move || async move {
            context.fire(&user_id, PassKind::Restore).await;
        }));

        info!(
            user_id = %user.id,
            hide_armed = hide.is_some(),
            %restore_at,
            "armed visibility timers"
        );

        // Two re-arms can race here (weekly sweep against refresh_user);
        // no lock is held across the quiet-period await, so the loser's
        // timers must be cancelled or both sets would fire.
        let replaced =
            self.jobs.lock().await.insert(user.id.clone(), UserJobs { cancel, hide, restore });
        if let Some(old) = replaced {
            old.cancel.cancel();
        }
        Ok(())
    }

    /// Cancel and drop any armed timers for a user.
    async fn disarm(&self, user_id: &str) {
        if let Some(jobs) = self.jobs.lock().await.remove(user_id) {
            jobs.cancel.cancel();
            debug!(user_id, "disarmed visibility timers");
        }
    }

    /// Retire the fired timer from the map, then run the pass.
    async fn fire(self: Arc<Self>, user_id: &str, kind: PassKind) {
        {
            let mut jobs = self.jobs.lock().await;
            if let Some(entry) = jobs.get_mut(user_id) {
                match kind {
                    PassKind::Hide => entry.hide = None,
                    PassKind::Restore => entry.restore = None,
                }
                if entry.is_empty() {
                    jobs.remove(user_id);
                }
            }
        }

        fire_pass(Arc::clone(&self.runner), user_id, kind).await;
    }

    async fn armed_info(&self) -> Vec<ArmedJobInfo> {
        let jobs = self.jobs.lock().await;
        let mut infos: Vec<ArmedJobInfo> =
            jobs.iter().map(|(user_id, jobs)| jobs.info(user_id)).collect();
        infos.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        infos
    }
}

async fn fire_pass(runner: Arc<dyn PassRunner>, user_id: &str, kind: PassKind) {
    match runner.run_pass(user_id, kind).await {
        Ok(report) => {
            info!(
                user_id,
                kind = kind.as_str(),
                affected = report.affected(),
                failed = report.failed(),
                "scheduled pass completed"
            );
        }
        Err(err) => {
            error!(user_id, kind = kind.as_str(), error = %err, "scheduled pass failed");
        }
    }
}

/// Shabbat scheduler: weekly sweep plus per-user one-shot timers.
pub struct ShabbatScheduler {
    context: Arc<SweepContext>,
    scheduler: Arc<RwLock<JobScheduler>>,
    config: SchedulerConfig,
    job_id: Uuid,
    monitor_handle: Option<JoinHandle<()>>,
}

impl ShabbatScheduler {
    /// Create a scheduler and register the weekly sweep job.
    pub async fn new(
        users: Arc<dyn UserRepository>,
        gate: Arc<dyn SubscriptionGate>,
        source: Arc<dyn QuietPeriodSource>,
        runner: Arc<dyn PassRunner>,
        config: SchedulerConfig,
    ) -> SchedulerResult<Self> {
        let raw_scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::CreationFailed(e.to_string()))?;

        // Born cancelled so nothing can arm before the first start().
        let parked = CancellationToken::new();
        parked.cancel();

        let context = Arc::new(SweepContext {
            users,
            gate,
            source,
            runner,
            jobs: Mutex::new(HashMap::new()),
            cancel: std::sync::Mutex::new(parked),
        });

        let mut scheduler = Self {
            context,
            scheduler: Arc::new(RwLock::new(raw_scheduler)),
            config,
            job_id: Uuid::nil(),
            monitor_handle: None,
        };

        scheduler.job_id = scheduler.register_sweep_job().await?;
        Ok(scheduler)
    }

    /// Start the scheduler: begin the cron loop and run an immediate sweep.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let parent = self.context.reset_parent_token();

        let scheduler = self.scheduler.clone();
        let start_result = tokio::time::timeout(START_TIMEOUT, async move {
            let guard = scheduler.write().await;
            guard.start().await
        })
        .await
        .map_err(|_| SchedulerError::Timeout { seconds: START_TIMEOUT.as_secs() })?;
        start_result.map_err(|e| SchedulerError::StartFailed(e.to_string()))?;

        // Catch-up sweep so a mid-week restart re-arms timers right away.
        let context = Arc::clone(&self.context);
        tokio::spawn(async move {
            context.sweep().await;
        });

        let handle = tokio::spawn(async move {
            parent.cancelled().await;
            debug!("shabbat scheduler monitor cancelled");
        });
        self.monitor_handle = Some(handle);

        info!(sweep_cron = %self.config.sweep_cron, "shabbat scheduler started");
        Ok(())
    }

    /// Stop the scheduler, cancelling every armed timer.
    ///
    /// A pass that is already executing is not interrupted.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.context.parent_token().cancel();

        let scheduler = self.scheduler.clone();
        let stop_result = tokio::time::timeout(STOP_TIMEOUT, async move {
            let mut guard = scheduler.write().await;
            guard.shutdown().await
        })
        .await
        .map_err(|_| SchedulerError::Timeout { seconds: STOP_TIMEOUT.as_secs() })?;
        stop_result.map_err(|e| SchedulerError::StopFailed(e.to_string()))?;

        if let Some(handle) = self.monitor_handle.take() {
            tokio::time::timeout(JOIN_TIMEOUT, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: JOIN_TIMEOUT.as_secs() })?
                .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;
        }

        self.context.jobs.lock().await.clear();

        // The cron scheduler cannot be restarted once shut down; replace
        // it and re-register the sweep so a later start() still works.
        let fresh = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::CreationFailed(e.to_string()))?;
        *self.scheduler.write().await = fresh;
        self.job_id = Uuid::nil();
        self.job_id = self.register_sweep_job().await?;

        info!("shabbat scheduler stopped");
        Ok(())
    }

    /// Returns true while the scheduler lifecycle is active.
    pub fn is_running(&self) -> bool {
        self.monitor_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Re-resolve and re-arm one user's timers immediately.
    ///
    /// Called after a settings change so the new offsets or schedule mode
    /// take effect without waiting for the weekly sweep.
    #[instrument(skip(self))]
    pub async fn refresh_user(&self, user_id: &str) -> Result<()> {
        let user = self
            .users()
            .find(user_id)
            .await?
            .ok_or_else(|| ShomerError::NotFound(format!("user not found: {user_id}")))?;
        self.context.schedule_user(&user).await
    }

    /// Disarm one user's timers without touching anyone else.
    pub async fn unschedule_user(&self, user_id: &str) {
        self.context.disarm(user_id).await;
    }

    /// Snapshot of the scheduler state and every armed timer.
    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus { is_running: self.is_running(), users: self.context.armed_info().await }
    }

    fn users(&self) -> &Arc<dyn UserRepository> {
        &self.context.users
    }

    async fn register_sweep_job(&mut self) -> SchedulerResult<Uuid> {
        if self.job_id != Uuid::nil() {
            return Ok(self.job_id);
        }

        let context = Arc::clone(&self.context);
        let job = Job::new_async(self.config.sweep_cron.as_str(), move |_id, _lock| {
            let context = Arc::clone(&context);
            Box::pin(async move {
                context.sweep().await;
            })
        })
        .map_err(|e| SchedulerError::JobRegistrationFailed(e.to_string()))?;

        let job_id = job.guid();
        let scheduler = self.scheduler.write().await;
        scheduler.add(job).await.map_err(|e| SchedulerError::JobRegistrationFailed(e.to_string()))?;

        debug!(cron = %self.config.sweep_cron, job_id = %job_id, "registered weekly sweep job");
        Ok(job_id)
    }
}

impl Drop for ShabbatScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ShabbatScheduler dropped while running; cancelling timers");
            self.context.parent_token().cancel();
        }
    }
}
