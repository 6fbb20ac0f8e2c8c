//! # Sync Job State Machine
//!
//! Tracks one sync run from creation to its terminal state.
//!
//! ## State Machine
//!
//! ```text
//! Pending → Running → Completed
//!     ↓         ↓
//!     └──────→ Failed
//! ```
//!
//! Timestamps are unix seconds supplied by the caller, so a run driven by a
//! test clock produces deterministic jobs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{SyncJob, SyncJobStats};
//!
//! let job = SyncJob::new(now).start(now)?;
//! let job = job.complete(SyncJobStats::default(), later)?;
//! ```

use crate::reconciler::ReconcileOutcome;
use crate::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a sync job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncJobId(Uuid);

impl SyncJobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SyncJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SyncJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The current status of a sync job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl SyncStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Completed | SyncStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Running => "running",
            SyncStatus::Completed => "completed",
            SyncStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters accumulated over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncJobStats {
    /// Releases fully reconciled (album and inventory written)
    pub releases_seen: u64,
    pub albums_created: u64,
    pub albums_updated: u64,
    pub inventory_created: u64,
    pub inventory_incremented: u64,
}

impl SyncJobStats {
    pub fn record(&mut self, outcome: &ReconcileOutcome) {
        self.releases_seen += 1;

        if outcome.album_created {
            self.albums_created += 1;
        } else {
            self.albums_updated += 1;
        }

        if outcome.inventory_created {
            self.inventory_created += 1;
        } else {
            self.inventory_incremented += 1;
        }
    }
}

/// A sync run with validated state transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncJob {
    pub id: SyncJobId,
    pub status: SyncStatus,
    pub stats: SyncJobStats,
    /// Set when the job failed
    pub error_message: Option<String>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
}

impl SyncJob {
    pub fn new(now: i64) -> Self {
        Self {
            id: SyncJobId::new(),
            status: SyncStatus::Pending,
            stats: SyncJobStats::default(),
            error_message: None,
            created_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the job is not in `Pending` state
    pub fn start(mut self, now: i64) -> Result<Self> {
        self.validate_transition(SyncStatus::Running)?;
        self.status = SyncStatus::Running;
        self.started_at = Some(now);
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns an error if the job is not in `Running` state
    pub fn complete(mut self, stats: SyncJobStats, now: i64) -> Result<Self> {
        self.validate_transition(SyncStatus::Completed)?;
        self.status = SyncStatus::Completed;
        self.stats = stats;
        self.completed_at = Some(now);
        Ok(self)
    }

    /// Mark the job failed, keeping the stats gathered before the failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the job is already terminal
    pub fn fail(mut self, error_message: String, stats: SyncJobStats, now: i64) -> Result<Self> {
        self.validate_transition(SyncStatus::Failed)?;
        self.status = SyncStatus::Failed;
        self.stats = stats;
        self.error_message = Some(error_message);
        self.completed_at = Some(now);
        Ok(self)
    }

    /// Run time in seconds, once the job has finished
    pub fn duration_secs(&self) -> Option<u64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start).max(0) as u64),
            _ => None,
        }
    }

    fn validate_transition(&self, to: SyncStatus) -> Result<()> {
        let valid = matches!(
            (self.status, to),
            (SyncStatus::Pending, SyncStatus::Running)
                | (SyncStatus::Pending, SyncStatus::Failed)
                | (SyncStatus::Running, SyncStatus::Completed)
                | (SyncStatus::Running, SyncStatus::Failed)
        );

        if !valid {
            return Err(SyncError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
                reason: format!("Cannot transition from {} to {}", self.status, to),
            });
        }

        Ok(())
    }
}
