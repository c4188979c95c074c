//! Invitation Controller
//!
//! Owns the batch job: sequential, rate-limited, cancellable adds over an
//! ordered identity list, plus the ad-hoc single add.
//!
//! # Architecture
//!
//! ```text
//! InvitationController
//!     ├── ctx (Arc<BatchContext>)   shared with the running batch task
//!     │     ├── stats               atomic counters
//!     │     ├── cancel              AtomicBool, checked once per item
//!     │     └── state               JobState
//!     └── job (Mutex<Option<JoinHandle>>)   supervisor slot
//!
//! Batch loop, per identity:
//! 1. Stop if cancellation was requested
//! 2. Normalize to @handle
//! 3. One add attempt, outcome counted, failures never abort
//! 4. Progress broadcast every 10th item
//! 5. Sleep the configured delay (not after the last item)
//! ```
//!
//! Only one batch runs at a time; `start` is rejected while a batch task is
//! alive. `add_one` shares the counters with the batch and ignores the
//! cancellation flag.

mod job;
mod stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub use job::{InvitationJob, JobOutcome, JobState, StartAck};
pub use stats::{SessionStats, StatsSnapshot};

use crate::identity::normalize;
use crate::membership::{MembershipClient, MembershipError};
use crate::messages;
use crate::notify::Notifier;

/// A progress broadcast goes out every this many processed identities.
pub const PROGRESS_EVERY: u64 = 10;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no identities to invite")]
    EmptySource,

    #[error("an invitation run is already in progress")]
    JobAlreadyRunning,

    #[error("identity is empty")]
    EmptyIdentity,

    #[error(transparent)]
    Membership(#[from] MembershipError),
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Destination group
    pub group_id: i64,
    /// Fixed pause between consecutive adds
    pub delay: Duration,
    /// Progress is broadcast when the processed count is a multiple of this
    pub progress_every: u64,
}

impl ControllerSettings {
    pub fn new(group_id: i64, delay: Duration) -> Self {
        Self {
            group_id,
            delay,
            progress_every: PROGRESS_EVERY,
        }
    }
}

struct BatchContext {
    membership: Arc<dyn MembershipClient>,
    notifier: Notifier,
    settings: ControllerSettings,
    stats: SessionStats,
    cancel: AtomicBool,
    state: Mutex<JobState>,
}

pub struct InvitationController {
    ctx: Arc<BatchContext>,
    job: Mutex<Option<JoinHandle<JobOutcome>>>,
}

impl InvitationController {
    pub fn new(
        membership: Arc<dyn MembershipClient>,
        notifier: Notifier,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            ctx: Arc::new(BatchContext {
                membership,
                notifier,
                settings,
                stats: SessionStats::default(),
                cancel: AtomicBool::new(false),
                state: Mutex::new(JobState::NotStarted),
            }),
            job: Mutex::new(None),
        }
    }

    /// Begin a batch over `identities` and return without waiting for it.
    ///
    /// Blank entries are dropped. An empty list is rejected before anything
    /// is touched. On success the cancellation flag is cleared and the
    /// counters are reset to `{0, 0, total}`.
    pub fn start(&self, identities: Vec<String>) -> Result<StartAck, ControllerError> {
        let identities: Vec<String> = identities
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if identities.is_empty() {
            return Err(ControllerError::EmptySource);
        }

        let mut slot = lock(&self.job);
        if self.job_in_flight(&slot) {
            return Err(ControllerError::JobAlreadyRunning);
        }

        let job = InvitationJob::new(identities);
        let ack = StartAck {
            job_id: job.id,
            total: job.total(),
        };

        self.ctx.cancel.store(false, Ordering::SeqCst);
        self.ctx.stats.reset(ack.total);
        self.ctx.set_state(JobState::Running);

        let ctx = Arc::clone(&self.ctx);
        *slot = Some(tokio::spawn(async move { ctx.run(job).await }));

        info!(job_id = %ack.job_id, total = ack.total, "Invitation run started");
        Ok(ack)
    }

    /// Request cancellation. Idempotent, never waits for the batch.
    ///
    /// Returns whether a batch was active when the flag was set.
    pub fn stop(&self) -> bool {
        self.ctx.cancel.store(true, Ordering::SeqCst);
        self.reap(&lock(&self.job));
        let active = self.ctx.state().is_active();
        info!(active, "Stop requested");
        active
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.reap(&lock(&self.job));
        self.ctx.snapshot()
    }

    /// Whether a batch task is still working.
    pub fn is_running(&self) -> bool {
        self.job_in_flight(&lock(&self.job))
    }

    pub fn cancellation_requested(&self) -> bool {
        self.ctx.cancel.load(Ordering::SeqCst)
    }

    /// Add a single identity right now, outside any batch.
    ///
    /// Returns the normalized identity on success.
    pub async fn add_one(&self, identity: &str) -> Result<String, ControllerError> {
        if identity.trim().is_empty() {
            return Err(ControllerError::EmptyIdentity);
        }
        let identity = normalize(identity);
        self.ctx.attempt(&identity).await?;
        Ok(identity)
    }

    /// Wait for the current batch task to finish.
    ///
    /// Returns `None` when no batch was started since the last wait.
    pub async fn wait(&self) -> Option<JobOutcome> {
        let handle = lock(&self.job).take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(error = %e, "Invitation task aborted");
                self.ctx.set_state(JobState::StoppedEarly);
                None
            }
        }
    }

    fn job_in_flight(&self, slot: &Option<JoinHandle<JobOutcome>>) -> bool {
        self.reap(slot);
        match slot {
            Some(handle) => !handle.is_finished(),
            // A waiter holds the handle; trust the recorded state.
            None => self.ctx.state().is_active(),
        }
    }

    /// A batch task that ended without recording a final state panicked.
    fn reap(&self, slot: &Option<JoinHandle<JobOutcome>>) {
        let Some(handle) = slot else { return };
        if handle.is_finished() && self.ctx.state().is_active() {
            error!("Invitation task ended without finishing the run");
            self.ctx.set_state(JobState::StoppedEarly);
        }
    }
}

impl BatchContext {
    async fn run(&self, job: InvitationJob) -> JobOutcome {
        let total = job.total();

        for identity in &job.identities {
            if self.cancel.load(Ordering::SeqCst) {
                self.notifier.broadcast(messages::STOPPED_EARLY).await;
                let stats = self.finish(JobState::StoppedEarly);
                info!(
                    job_id = %job.id,
                    processed = stats.processed,
                    total,
                    "Invitation run stopped by admin"
                );
                return JobOutcome::StoppedEarly {
                    job_id: job.id,
                    stats,
                };
            }

            let position = self.stats.begin_item();
            // Failures are counted and logged inside `attempt`.
            let _ = self.attempt(&normalize(identity)).await;

            if position % self.settings.progress_every.max(1) == 0 {
                let stats = self.snapshot();
                self.notifier.broadcast(&messages::progress(&stats)).await;
            }

            if position < total {
                tokio::time::sleep(self.settings.delay).await;
            }
        }

        let stats = self.snapshot();
        self.notifier.broadcast(&messages::report(&stats)).await;
        let stats = self.finish(JobState::Completed);
        info!(
            job_id = %job.id,
            success = stats.success,
            failed = stats.failed,
            elapsed_secs = (chrono::Utc::now() - job.started_at).num_seconds(),
            "Invitation run completed"
        );
        JobOutcome::Completed {
            job_id: job.id,
            stats,
        }
    }

    /// Exactly one add attempt; the outcome lands in the counters.
    async fn attempt(&self, identity: &str) -> Result<(), MembershipError> {
        match self.membership.add(self.settings.group_id, identity).await {
            Ok(()) => {
                self.stats.record(true);
                info!(identity, "Added to group");
                Ok(())
            }
            Err(e) => {
                self.stats.record(false);
                warn!(identity, error = %e, "Failed to add to group");
                Err(e)
            }
        }
    }

    fn state(&self) -> JobState {
        *lock(&self.state)
    }

    fn set_state(&self, state: JobState) {
        *lock(&self.state) = state;
    }

    fn finish(&self, state: JobState) -> StatsSnapshot {
        self.set_state(state);
        self.stats.snapshot(state)
    }

    fn snapshot(&self) -> StatsSnapshot {
        let state = match self.state() {
            JobState::Running if self.cancel.load(Ordering::SeqCst) => JobState::StopRequested,
            other => other,
        };
        self.stats.snapshot(state)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
