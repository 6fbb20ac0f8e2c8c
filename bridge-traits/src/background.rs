//! Background Execution and Task Scheduling
//!
//! Recurring task execution for the catalog sync trigger.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Scheduled task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task is scheduled but not yet running
    Scheduled,
    /// Task is currently executing
    Running,
    /// Last execution completed successfully
    Completed,
    /// Last execution failed
    Failed,
    /// Task was cancelled
    Cancelled,
}

/// Background task executor trait
///
/// An executor runs handlers registered under a task name on a fixed
/// interval. A recurring task executes its handler
/// inline in a single loop, so one task never overlaps itself: if a run takes
/// longer than the interval the next tick is delayed rather than stacked.
///
/// Handler failures are reported through the task status and logged; they
/// never cancel a recurring schedule.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::BackgroundExecutor;
/// use std::time::Duration;
///
/// async fn schedule_sync(executor: &dyn BackgroundExecutor) -> Result<()> {
///     executor
///         .schedule_task("catalog_sync", Duration::from_secs(24 * 60 * 60))
///         .await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait BackgroundExecutor: Send + Sync {
    /// Schedule a recurring task. The first execution happens immediately.
    ///
    /// # Errors
    ///
    /// Fails when no handler is registered under `task_id` or when the task is
    /// already scheduled.
    async fn schedule_task(&self, task_id: &str, interval: Duration) -> Result<TaskId>;

    /// Cancel a scheduled task
    async fn cancel_task(&self, task_id: &TaskId) -> Result<()>;

    /// Get status of a task
    async fn get_task_status(&self, task_id: &TaskId) -> Result<TaskStatus>;

    /// Estimated time until the next execution.
    ///
    /// Returns `None` once the task was cancelled.
    async fn next_execution_time(&self, task_id: &TaskId) -> Result<Option<Duration>>;
}
