//! Shared task store handle.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use super::registry::{TaskRegistry, TaskSummary, Upsert};
use super::types::{Task, TaskEvent, TaskId, TaskInfo, TaskLabel, TaskStatus};
use crate::backend::StatusReport;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Cloneable handle to the task registry, owned by one controller and handed
/// to whoever needs to observe or mutate tasks.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<TaskStoreInner>,
}

struct TaskStoreInner {
    state: RwLock<StoreState>,
    event_tx: broadcast::Sender<TaskEvent>,
    /// Parent of every poll token; cancelled on shutdown.
    root: CancellationToken,
    clock: Clock,
}

struct StoreState {
    registry: TaskRegistry,
    polls: HashMap<TaskId, PollLease>,
    next_generation: u64,
}

/// Stop token for one poll chain, tagged with the generation that owns the
/// registry slot. A newer chain on the same id gets a higher generation.
#[derive(Debug, Clone)]
pub struct PollLease {
    pub generation: u64,
    pub token: CancellationToken,
}

impl TaskStore {
    pub fn new(retention: Duration) -> Self {
        Self::with_clock(retention, Arc::new(Utc::now))
    }

    pub fn with_clock(retention: Duration, clock: Clock) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(TaskStoreInner {
                state: RwLock::new(StoreState {
                    registry: TaskRegistry::with_retention(retention),
                    polls: HashMap::new(),
                    next_generation: 0,
                }),
                event_tx,
                root: CancellationToken::new(),
                clock,
            }),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.inner.clock)()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.inner.event_tx.subscribe()
    }

    fn emit(&self, event: TaskEvent) {
        let _ = self.inner.event_tx.send(event);
    }

    fn emit_upsert(&self, id: TaskId, outcome: Upsert, status: TaskStatus, now: DateTime<Utc>) {
        match outcome {
            Upsert::Inserted => self.emit(TaskEvent::Added {
                task_id: id,
                timestamp: now,
            }),
            Upsert::Updated => self.emit(TaskEvent::Updated {
                task_id: id,
                status,
                timestamp: now,
            }),
        }
    }

    /// Starts tracking a freshly submitted task as `Pending`.
    pub async fn add(&self, id: TaskId, label: Option<TaskLabel>) {
        let now = self.now();
        let outcome = {
            let mut state = self.inner.state.write().await;
            let outcome = state.registry.upsert(
                id.clone(),
                TaskStatus::Pending,
                TaskInfo::Empty,
                now,
            );
            if let Some(label) = label {
                state.registry.set_label(&id, label);
            }
            outcome
        };
        self.emit_upsert(id, outcome, TaskStatus::Pending, now);
    }

    pub async fn upsert(&self, id: TaskId, status: TaskStatus, info: TaskInfo) {
        let now = self.now();
        let outcome = {
            let mut state = self.inner.state.write().await;
            state.registry.upsert(id.clone(), status, info, now)
        };
        self.emit_upsert(id, outcome, status, now);
    }

    /// Applies a poll response to a task that is still tracked.
    ///
    /// Returns `None` when the task was removed meanwhile; the response is
    /// dropped rather than re-creating the task.
    pub async fn apply_report(&self, id: &TaskId, report: StatusReport) -> Option<Task> {
        let now = self.now();
        let task = {
            let mut state = self.inner.state.write().await;
            if !state.registry.contains(id) {
                return None;
            }
            state.registry.apply_report(id.clone(), report, now);
            state.registry.get(id).cloned()
        }?;
        self.emit_upsert(id.clone(), Upsert::Updated, task.status, now);
        Some(task)
    }

    /// Marks a still-tracked task as failed with `Error`.
    pub async fn record_error(&self, id: &TaskId, message: String) -> Option<Task> {
        let now = self.now();
        let task = {
            let mut state = self.inner.state.write().await;
            if !state.registry.contains(id) {
                return None;
            }
            state
                .registry
                .upsert(id.clone(), TaskStatus::Error, TaskInfo::Message(message), now);
            state.registry.get(id).cloned()
        }?;
        self.emit_upsert(id.clone(), Upsert::Updated, TaskStatus::Error, now);
        Some(task)
    }

    /// Deletes the task and stops its poll chain, if any.
    pub async fn remove(&self, id: &TaskId) -> Option<Task> {
        let removed = {
            let mut state = self.inner.state.write().await;
            if let Some(lease) = state.polls.remove(id) {
                lease.token.cancel();
            }
            state.registry.remove(id)
        };
        if removed.is_some() {
            self.emit(TaskEvent::Removed {
                task_id: id.clone(),
                timestamp: self.now(),
            });
        }
        removed
    }

    pub async fn sweep(&self) -> Vec<TaskId> {
        self.sweep_at(self.now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Vec<TaskId> {
        let swept = {
            let mut state = self.inner.state.write().await;
            let swept = state.registry.sweep(now);
            for id in &swept {
                state.polls.remove(id);
            }
            swept
        };
        if !swept.is_empty() {
            tracing::debug!(
                target: "codelib.task",
                stage = "task.sweep",
                removed = swept.len()
            );
            self.emit(TaskEvent::Swept {
                task_ids: swept.clone(),
                timestamp: now,
            });
        }
        swept
    }

    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.inner.state.read().await.registry.get(id).cloned()
    }

    pub async fn list(&self) -> Vec<Task> {
        self.inner.state.read().await.registry.list()
    }

    pub async fn summary(&self) -> TaskSummary {
        self.inner.state.read().await.registry.summary()
    }

    /// Hands out the lease for a new poll chain on `id`, stopping any older one.
    pub async fn register_poll(&self, id: &TaskId) -> PollLease {
        let token = self.inner.root.child_token();
        let mut state = self.inner.state.write().await;
        state.next_generation += 1;
        let lease = PollLease {
            generation: state.next_generation,
            token,
        };
        if let Some(previous) = state.polls.insert(id.clone(), lease.clone()) {
            previous.token.cancel();
        }
        lease
    }

    /// Releases the slot for `id` if it still belongs to `generation`.
    pub async fn finish_poll(&self, id: &TaskId, generation: u64) {
        let mut state = self.inner.state.write().await;
        if state
            .polls
            .get(id)
            .is_some_and(|lease| lease.generation == generation)
        {
            state.polls.remove(id);
        }
    }

    pub async fn is_polling(&self, id: &TaskId) -> bool {
        self.inner.state.read().await.polls.contains_key(id)
    }

    /// Token cancelled by [`TaskStore::shutdown`]; background jobs derive from it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.root.clone()
    }

    /// Stops every poll chain and background job tied to this store.
    pub fn shutdown(&self) {
        self.inner.root.cancel();
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new(Duration::seconds(super::registry::DEFAULT_RETENTION_SECS))
    }
}
