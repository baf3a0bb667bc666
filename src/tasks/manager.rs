//! Background Task Manager
//!
//! Runs long operations (such as blinking a device light) independently of
//! the request that triggered them. A request waits a bounded time for the
//! task; if it has not finished by then the caller gets an executing task
//! handle back and the task keeps running.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Task identifier
pub type TaskId = String;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the task manager
#[derive(Debug, Clone)]
pub struct TaskManagerConfig {
    /// How long finished tasks stay visible in task listings
    pub retention: Duration,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(300),
        }
    }
}

// =============================================================================
// Task Info
// =============================================================================

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Executing,
    Success,
    Failure,
    Cancelled,
}

/// Public view of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: TaskId,
    pub name: String,
    pub metadata: BTreeMap<String, String>,
    pub state: TaskState,
    pub begin_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TaskInfo {
    fn new(id: TaskId, name: &str, metadata: BTreeMap<String, String>) -> Self {
        Self {
            id,
            name: name.to_string(),
            metadata,
            state: TaskState::Executing,
            begin_time: Utc::now(),
            end_time: None,
            error: None,
        }
    }

    fn finish(&mut self, state: TaskState, error: Option<String>) {
        self.state = state;
        self.error = error;
        self.end_time = Some(Utc::now());
    }

    pub fn is_executing(&self) -> bool {
        self.state == TaskState::Executing
    }
}

/// Result of submitting a task
#[derive(Debug)]
pub enum TaskOutcome {
    /// The task finished within the wait period
    Finished { info: TaskInfo, result: Result<()> },
    /// The task is still running in the background
    Executing(TaskInfo),
}

impl TaskOutcome {
    pub fn info(&self) -> &TaskInfo {
        match self {
            TaskOutcome::Finished { info, .. } => info,
            TaskOutcome::Executing(info) => info,
        }
    }
}

struct TaskEntry {
    info: TaskInfo,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// Name and metadata identifying an executing task
type TaskKey = (String, BTreeMap<String, String>);

// =============================================================================
// Task Manager
// =============================================================================

/// Tracks background tasks and their cancellation tokens
pub struct TaskManager {
    config: TaskManagerConfig,
    tasks: Arc<DashMap<TaskId, TaskEntry>>,
    /// Executing task per name and metadata
    executing: Arc<DashMap<TaskKey, TaskId>>,
    sequence: AtomicU64,
}

impl TaskManager {
    /// Create a new task manager
    pub fn new(config: TaskManagerConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            tasks: Arc::new(DashMap::new()),
            executing: Arc::new(DashMap::new()),
            sequence: AtomicU64::new(0),
        })
    }

    /// Run `job` as a background task, waiting up to `wait_for` for it.
    ///
    /// The job receives a cancellation token it must observe. When a task
    /// with the same name and metadata is still executing, no new task is
    /// started and the existing one is returned.
    pub async fn run<F, Fut>(
        &self,
        name: &str,
        metadata: BTreeMap<String, String>,
        wait_for: Duration,
        job: F,
    ) -> TaskOutcome
    where
        F: FnOnce(CancellationToken) -> Fut + Send,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.prune_finished();

        let key: TaskKey = (name.to_string(), metadata.clone());
        let id = self.next_task_id();
        let cancel = CancellationToken::new();
        let info = TaskInfo::new(id.clone(), name, metadata);

        // The executing index shard stays locked until the new task is
        // registered, so identical submissions cannot both start.
        match self.executing.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                if let Some(existing) = self.get(slot.get()).filter(TaskInfo::is_executing) {
                    debug!("Task {} already executing as {}", name, existing.id);
                    return TaskOutcome::Executing(existing);
                }
                self.register(&info, &cancel);
                slot.insert(id.clone());
            }
            Entry::Vacant(slot) => {
                self.register(&info, &cancel);
                slot.insert(id.clone());
            }
        }
        info!("Started task {} ({}) {:?}", name, id, info.metadata);

        let fut = job(cancel.clone());
        let (done_tx, done_rx) = oneshot::channel();
        let tasks = self.tasks.clone();
        let executing = self.executing.clone();
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            let result = fut.await;
            let (state, error) = match &result {
                Err(e) => (TaskState::Failure, Some(e.to_string())),
                Ok(()) if cancel.is_cancelled() => (TaskState::Cancelled, None),
                Ok(()) => (TaskState::Success, None),
            };
            if let Some(mut entry) = tasks.get_mut(&task_id) {
                entry.info.finish(state, error);
            }
            executing.remove_if(&key, |_, current| current == &task_id);
            debug!("Task {} finished: {:?}", task_id, state);
            // The submitter may have stopped waiting
            let _ = done_tx.send(result);
        });
        if let Some(mut entry) = self.tasks.get_mut(&id) {
            entry.handle = Some(handle);
        }

        match tokio::time::timeout(wait_for, done_rx).await {
            Ok(Ok(result)) => TaskOutcome::Finished {
                info: self.get(&id).unwrap_or(info),
                result,
            },
            Ok(Err(_)) => {
                let reason = format!("task {} aborted", id);
                warn!("{}", reason);
                if let Some(mut entry) = self.tasks.get_mut(&id) {
                    entry.info.finish(TaskState::Failure, Some(reason.clone()));
                }
                self.executing
                    .remove_if(&(info.name.clone(), info.metadata.clone()), |_, current| {
                        current == &id
                    });
                TaskOutcome::Finished {
                    info: self.get(&id).unwrap_or(info),
                    result: Err(Error::Internal(reason)),
                }
            }
            Err(_) => TaskOutcome::Executing(self.get(&id).unwrap_or(info)),
        }
    }

    /// Get a task by id
    pub fn get(&self, id: &str) -> Option<TaskInfo> {
        self.tasks.get(id).map(|entry| entry.info.clone())
    }

    /// List tasks, optionally restricted to one name, oldest first
    pub fn list(&self, name: Option<&str>) -> Vec<TaskInfo> {
        let mut tasks: Vec<TaskInfo> = self
            .tasks
            .iter()
            .filter(|entry| name.map_or(true, |n| entry.info.name == n))
            .map(|entry| entry.info.clone())
            .collect();
        tasks.sort_by(|a, b| a.begin_time.cmp(&b.begin_time).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    /// Number of tasks currently executing
    pub fn executing_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|entry| entry.info.is_executing())
            .count()
    }

    /// Request cancellation of a task
    pub fn cancel(&self, id: &str) -> Result<TaskInfo> {
        let entry = self.tasks.get(id).ok_or_else(|| Error::TaskNotFound {
            task_id: id.to_string(),
        })?;
        if entry.info.is_executing() {
            info!("Cancelling task {} ({})", entry.info.name, id);
            entry.cancel.cancel();
        }
        Ok(entry.info.clone())
    }

    /// Cancel every executing task and wait for all of them to finish
    pub async fn shutdown(&self) {
        let mut handles = Vec::new();
        for mut entry in self.tasks.iter_mut() {
            entry.cancel.cancel();
            if let Some(handle) = entry.handle.take() {
                handles.push(handle);
            }
        }

        info!("Waiting for {} background tasks", handles.len());
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("Background task aborted during shutdown: {}", e);
            }
        }
    }

    fn register(&self, info: &TaskInfo, cancel: &CancellationToken) {
        self.tasks.insert(
            info.id.clone(),
            TaskEntry {
                info: info.clone(),
                cancel: cancel.clone(),
                handle: None,
            },
        );
    }

    fn prune_finished(&self) {
        let now = Utc::now();
        let retention = self.config.retention;
        self.tasks.retain(|_, entry| match entry.info.end_time {
            None => true,
            Some(end) => (now - end)
                .to_std()
                .map(|age| age <= retention)
                .unwrap_or(true),
        });
    }

    fn next_task_id(&self) -> TaskId {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:06}", Utc::now().format("%Y%m%d%H%M%S"), seq)
    }
}
