//! Background Task Execution Implementation

use async_trait::async_trait;
use bridge_traits::{
    background::{BackgroundExecutor, TaskId, TaskStatus},
    error::{BridgeError, Result},
    time::{Clock, SystemClock},
};
use futures_util::{future::BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

type TaskHandler = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;
type TaskTable = Arc<RwLock<HashMap<TaskId, TaskInfo>>>;

/// Tokio-based background executor for desktop and server hosts.
///
/// Handlers are registered by task name and invoked inline by the task's own
/// loop, so executions of one task are strictly sequential.
pub struct TokioBackgroundExecutor {
    tasks: TaskTable,
    handlers: Arc<RwLock<HashMap<String, TaskHandler>>>,
    clock: Arc<dyn Clock>,
}

struct TaskInfo {
    status: TaskStatus,
    handle: Option<JoinHandle<()>>,
    cancel: Option<oneshot::Sender<()>>,
    last_run: Option<i64>,
    next_run: Option<i64>,
}

impl TaskInfo {
    fn scheduled(cancel: oneshot::Sender<()>, next_run: i64) -> Self {
        Self {
            status: TaskStatus::Scheduled,
            handle: None,
            cancel: Some(cancel),
            last_run: None,
            next_run: Some(next_run),
        }
    }
}

impl TokioBackgroundExecutor {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an executor whose bookkeeping timestamps come from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    fn duration_to_millis(duration: Duration) -> i64 {
        duration.as_millis().min(i64::MAX as u128) as i64
    }

    fn millis_to_duration(millis: i64) -> Duration {
        if millis <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(millis as u64)
        }
    }

    /// Register a handler that will be invoked when the task executes.
    pub async fn register_task_handler<F, Fut>(&self, task_id: &str, handler: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let mut handlers = self.handlers.write().await;
        handlers.insert(task_id.to_string(), Arc::new(move || handler().boxed()));
        Ok(())
    }

    async fn handler_for(&self, task_id: &str) -> Result<TaskHandler> {
        let handlers = self.handlers.read().await;
        handlers.get(task_id).cloned().ok_or_else(|| {
            BridgeError::OperationFailed(format!("No handler registered for task: {}", task_id))
        })
    }

    /// Reserve the task slot. A task that is still live cannot be scheduled twice.
    async fn reserve(&self, id: &TaskId, info: TaskInfo) -> Result<()> {
        let mut tasks = self.tasks.write().await;
        if let Some(existing) = tasks.get(id) {
            let finished = existing
                .handle
                .as_ref()
                .map(|handle| handle.is_finished())
                .unwrap_or(false);
            if !finished {
                return Err(BridgeError::OperationFailed(format!(
                    "Task already scheduled: {}",
                    id
                )));
            }
        }
        tasks.insert(id.clone(), info);
        Ok(())
    }

    async fn attach_handle(&self, id: &TaskId, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.write().await;
        if let Some(info) = tasks.get_mut(id) {
            info.handle = Some(handle);
        }
    }

    async fn mark_running(tasks: &TaskTable, id: &TaskId) {
        let mut tasks = tasks.write().await;
        if let Some(info) = tasks.get_mut(id) {
            info.status = TaskStatus::Running;
        }
    }

    async fn mark_cancelled(tasks: &TaskTable, id: &TaskId) {
        let mut tasks = tasks.write().await;
        if let Some(info) = tasks.get_mut(id) {
            info.status = TaskStatus::Cancelled;
            info.next_run = None;
        }
    }

    async fn record_result(
        tasks: &TaskTable,
        id: &TaskId,
        result: Result<()>,
        now: i64,
        next_run: Option<i64>,
    ) {
        let status = match result {
            Ok(()) => TaskStatus::Completed,
            Err(err) => {
                warn!(task_id = %id, error = %err, "Background task failed");
                TaskStatus::Failed
            }
        };

        let mut tasks = tasks.write().await;
        if let Some(info) = tasks.get_mut(id) {
            info.last_run = Some(now);
            info.next_run = next_run;
            info.status = status;
        }
    }

    async fn run_recurring_task(
        tasks: TaskTable,
        id: TaskId,
        handler: TaskHandler,
        period: Duration,
        mut cancel_rx: oneshot::Receiver<()>,
        clock: Arc<dyn Clock>,
    ) {
        let mut ticker = tokio::time::interval(period);
        // A run that outlasts the period pushes the next tick back instead of
        // firing a burst of catch-up runs.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let period_millis = Self::duration_to_millis(period);

        loop {
            tokio::select! {
                _ = &mut cancel_rx => {
                    Self::mark_cancelled(&tasks, &id).await;
                    break;
                }
                _ = ticker.tick() => {
                    Self::mark_running(&tasks, &id).await;
                    let result = handler().await;
                    let now = clock.unix_timestamp_millis();
                    Self::record_result(
                        &tasks,
                        &id,
                        result,
                        now,
                        Some(now.saturating_add(period_millis)),
                    )
                    .await;
                }
            }
        }
    }
}

impl Default for TokioBackgroundExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackgroundExecutor for TokioBackgroundExecutor {
    async fn schedule_task(&self, task_id: &str, interval: Duration) -> Result<TaskId> {
        if interval.is_zero() {
            return Err(BridgeError::OperationFailed(
                "Recurring task interval must be greater than zero".to_string(),
            ));
        }

        let id = TaskId::new(task_id);
        let handler = self.handler_for(task_id).await?;
        let (cancel_tx, cancel_rx) = oneshot::channel();

        self.reserve(
            &id,
            TaskInfo::scheduled(cancel_tx, self.clock.unix_timestamp_millis()),
        )
        .await?;

        info!(
            task_id = task_id,
            interval_secs = interval.as_secs(),
            "Scheduled recurring task"
        );

        let handle = tokio::spawn(Self::run_recurring_task(
            Arc::clone(&self.tasks),
            id.clone(),
            handler,
            interval,
            cancel_rx,
            Arc::clone(&self.clock),
        ));
        self.attach_handle(&id, handle).await;

        Ok(id)
    }

    async fn cancel_task(&self, task_id: &TaskId) -> Result<()> {
        debug!(task_id = %task_id, "Cancelling task");

        let removed = {
            let mut tasks = self.tasks.write().await;
            tasks.remove(task_id)
        };

        match removed {
            Some(mut info) => {
                if let Some(cancel) = info.cancel.take() {
                    let _ = cancel.send(());
                }
                if let Some(handle) = info.handle.take() {
                    handle.abort();
                }
                Ok(())
            }
            None => Err(BridgeError::OperationFailed(format!(
                "Task not found: {}",
                task_id
            ))),
        }
    }

    async fn get_task_status(&self, task_id: &TaskId) -> Result<TaskStatus> {
        let tasks = self.tasks.read().await;
        tasks
            .get(task_id)
            .map(|info| info.status)
            .ok_or_else(|| BridgeError::OperationFailed(format!("Task not found: {}", task_id)))
    }

    async fn next_execution_time(&self, task_id: &TaskId) -> Result<Option<Duration>> {
        let tasks = self.tasks.read().await;
        let info = tasks
            .get(task_id)
            .ok_or_else(|| BridgeError::OperationFailed(format!("Task not found: {}", task_id)))?;

        Ok(info.next_run.map(|next| {
            Self::millis_to_duration(next - self.clock.unix_timestamp_millis())
        }))
    }
}
