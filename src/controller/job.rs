//! Job lifecycle types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::StatsSnapshot;

/// Lifecycle of the current (or most recent) batch job.
///
/// ```text
/// NotStarted -> Running -> StopRequested -> StoppedEarly
///                   \                  \
///                    +-> Completed      +-> Completed (stop arrived after the last item)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    NotStarted,
    Running,
    /// Running with a pending cancellation not yet observed by the loop
    StopRequested,
    Completed,
    StoppedEarly,
}

impl JobState {
    /// A batch task is (or may still be) working.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Running | JobState::StopRequested)
    }
}

/// Immutable input of one batch run.
#[derive(Debug, Clone)]
pub struct InvitationJob {
    pub id: Uuid,
    pub identities: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl InvitationJob {
    pub fn new(identities: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identities,
            started_at: Utc::now(),
        }
    }

    pub fn total(&self) -> u64 {
        self.identities.len() as u64
    }
}

/// Returned by `start`: the job was accepted and is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartAck {
    pub job_id: Uuid,
    pub total: u64,
}

/// How a batch task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Every identity was attempted
    Completed { job_id: Uuid, stats: StatsSnapshot },
    /// Cancellation was observed before the list was exhausted
    StoppedEarly { job_id: Uuid, stats: StatsSnapshot },
}

impl JobOutcome {
    pub fn stats(&self) -> &StatsSnapshot {
        match self {
            JobOutcome::Completed { stats, .. } | JobOutcome::StoppedEarly { stats, .. } => stats,
        }
    }
}
