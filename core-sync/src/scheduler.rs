//! # Sync Scheduler
//!
//! Runs [`SyncCoordinator::run_sync`] on a fixed interval through the
//! background executor. The first pass starts immediately.
//!
//! The executor runs the task's handler inline, so scheduled passes never
//! overlap each other. A pass that fails is logged and the schedule carries on.

use crate::coordinator::SyncCoordinator;
use crate::{Result, SyncError};
use bridge_desktop::TokioBackgroundExecutor;
use bridge_traits::background::{BackgroundExecutor, TaskId, TaskStatus};
use bridge_traits::error::BridgeError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// Task name used with the background executor
pub const SYNC_TASK_ID: &str = "catalog_sync";

pub struct SyncScheduler {
    coordinator: Arc<SyncCoordinator>,
    executor: Arc<TokioBackgroundExecutor>,
    interval: Duration,
    task: Mutex<Option<TaskId>>,
}

impl SyncScheduler {
    pub fn new(
        coordinator: Arc<SyncCoordinator>,
        executor: Arc<TokioBackgroundExecutor>,
        interval: Duration,
    ) -> Self {
        Self {
            coordinator,
            executor,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Register the sync handler and start the recurring task.
    ///
    /// # Errors
    ///
    /// Fails if the schedule is already running or the executor rejects it.
    pub async fn start(&self) -> Result<TaskId> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return Err(SyncError::Scheduler(format!(
                "{} is already scheduled",
                SYNC_TASK_ID
            )));
        }

        let coordinator = Arc::clone(&self.coordinator);
        self.executor
            .register_task_handler(SYNC_TASK_ID, move || {
                let coordinator = Arc::clone(&coordinator);
                async move {
                    coordinator
                        .run_sync()
                        .await
                        .map(|_| ())
                        .map_err(|e| BridgeError::OperationFailed(e.to_string()))
                }
            })
            .await
            .map_err(scheduler_error)?;

        let task_id = self
            .executor
            .schedule_task(SYNC_TASK_ID, self.interval)
            .await
            .map_err(scheduler_error)?;

        info!(task_id = %task_id, interval_secs = self.interval.as_secs(), "Catalog sync scheduled");
        *task = Some(task_id.clone());
        Ok(task_id)
    }

    /// Cancel the recurring task.
    ///
    /// A pass already in progress is aborted and its job is recorded as
    /// `Failed` with [`CANCELLED_MESSAGE`](crate::coordinator::CANCELLED_MESSAGE).
    pub async fn stop(&self) -> Result<()> {
        let Some(task_id) = self.task.lock().await.take() else {
            return Ok(());
        };

        self.executor
            .cancel_task(&task_id)
            .await
            .map_err(scheduler_error)?;
        info!(task_id = %task_id, "Catalog sync schedule stopped");
        Ok(())
    }

    /// Status of the scheduled task, `None` when not started
    pub async fn status(&self) -> Result<Option<TaskStatus>> {
        let task = self.task.lock().await.clone();
        match task {
            Some(task_id) => Ok(Some(
                self.executor
                    .get_task_status(&task_id)
                    .await
                    .map_err(scheduler_error)?,
            )),
            None => Ok(None),
        }
    }

    /// Time until the next scheduled pass
    pub async fn next_run_in(&self) -> Result<Option<Duration>> {
        let task = self.task.lock().await.clone();
        match task {
            Some(task_id) => self
                .executor
                .next_execution_time(&task_id)
                .await
                .map_err(scheduler_error),
            None => Ok(None),
        }
    }
}

fn scheduler_error(e: BridgeError) -> SyncError {
    SyncError::Scheduler(e.to_string())
}
