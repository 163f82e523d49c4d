//! Status polling for one task at a time.
//!
//! A chain issues one `GET /status/{id}`, applies it to the [`TaskStore`] and,
//! while the task stays active, sleeps and asks again. Requests for one task
//! never overlap. The chain ends on a terminal status, on a transport error,
//! when the task is removed from the store, or when its stop token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::store::TaskStore;
use super::types::{Task, TaskId, TaskStatus};
use crate::backend::{fetch_chunks_by_id, ChunkRef, IndexerBackend};
use crate::error::BackendError;
use crate::notify::{Notifier, Severity};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const MIN_POLL_INTERVAL: Duration =
    Duration::from_millis(crate::config::MIN_POLL_INTERVAL_MS);

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Task finished; `chunks` are the fragments it produced, if any.
    Succeeded { task: Task, chunks: Vec<ChunkRef> },
    /// Task finished but its chunks could not be loaded.
    FetchFailed { task: Task, error: BackendError },
    /// Backend reported `Failure`/`Error`, or the status request itself failed.
    Failed { task: Task },
    /// Task was removed from the store while polling.
    Removed,
    /// Stop token fired.
    Stopped,
}

/// Owner-side handle for a running poll chain.
#[derive(Debug)]
pub struct PollHandle {
    task_id: TaskId,
    token: CancellationToken,
    join: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Halts the chain at its next suspension point.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn wait(self) -> PollOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    target: "codelib.task",
                    stage = "task.poll.join",
                    task_id = %self.task_id,
                    error = %err
                );
                PollOutcome::Stopped
            }
        }
    }
}

#[derive(Clone)]
pub struct Poller {
    backend: Arc<dyn IndexerBackend>,
    store: TaskStore,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

impl Poller {
    /// `interval` below [`MIN_POLL_INTERVAL`] is raised to it.
    pub fn new(
        backend: Arc<dyn IndexerBackend>,
        store: TaskStore,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            backend,
            store,
            notifier,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Spawns a poll chain for `task_id`. An older chain for the same id is stopped.
    pub async fn spawn(&self, task_id: TaskId) -> PollHandle {
        let lease = self.store.register_poll(&task_id).await;
        let this = self.clone();
        let id = task_id.clone();
        let chain_token = lease.token.clone();
        let generation = lease.generation;
        let join = tokio::spawn(async move {
            let outcome = this.run(&id, &chain_token).await;
            if matches!(outcome, PollOutcome::Stopped | PollOutcome::Removed) {
                this.notifier.set_loading(false);
            }
            this.store.finish_poll(&id, generation).await;
            outcome
        });
        PollHandle {
            task_id,
            token: lease.token,
            join,
        }
    }

    async fn run(&self, id: &TaskId, token: &CancellationToken) -> PollOutcome {
        loop {
            let response = tokio::select! {
                biased;
                _ = token.cancelled() => return PollOutcome::Stopped,
                r = self.backend.status(id) => r,
            };

            let report = match response {
                Ok(report) => report,
                Err(err) => return self.on_transport_error(id, err).await,
            };

            tracing::debug!(
                target: "codelib.task",
                stage = "task.poll",
                task_id = %id,
                status = %report.status
            );

            let Some(task) = self.store.apply_report(id, report).await else {
                return PollOutcome::Removed;
            };

            if task.is_active() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return PollOutcome::Stopped,
                    _ = tokio::time::sleep(self.interval) => continue,
                }
            }

            self.notifier.set_loading(false);
            return match task.status {
                TaskStatus::Success => self.on_success(task).await,
                _ => {
                    self.notifier
                        .notify(&format!("Processing failed: {}", task.info), Severity::Error);
                    PollOutcome::Failed { task }
                }
            };
        }
    }

    async fn on_transport_error(&self, id: &TaskId, err: BackendError) -> PollOutcome {
        tracing::warn!(
            target: "codelib.task",
            stage = "task.poll.error",
            task_id = %id,
            error = %err
        );
        self.notifier.set_loading(false);
        let message = err.user_message().to_string();
        match self.store.record_error(id, message.clone()).await {
            Some(task) => {
                self.notifier.notify(
                    &format!("Error checking task status: {message}"),
                    Severity::Error,
                );
                PollOutcome::Failed { task }
            }
            None => PollOutcome::Removed,
        }
    }

    async fn on_success(&self, task: Task) -> PollOutcome {
        self.notifier
            .notify("Code processed successfully", Severity::Success);
        let chunk_ids = task.info.chunk_ids();
        if chunk_ids.is_empty() {
            return PollOutcome::Succeeded {
                task,
                chunks: Vec::new(),
            };
        }

        self.notifier.set_loading(true);
        let fetched = fetch_chunks_by_id(self.backend.as_ref(), &chunk_ids).await;
        self.notifier.set_loading(false);
        match fetched {
            Ok(chunks) => {
                self.notifier.notify(
                    &format!("Loaded {} processed code fragments", chunks.len()),
                    Severity::Success,
                );
                PollOutcome::Succeeded { task, chunks }
            }
            Err(error) => {
                self.notifier
                    .notify(&format!("Error: {}", error.user_message()), Severity::Error);
                PollOutcome::FetchFailed { task, error }
            }
        }
    }
}
