use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::store::TaskStore;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub const MIN_SWEEP_INTERVAL: Duration =
    Duration::from_secs(crate::config::MIN_SWEEP_INTERVAL_SECS);

/// Periodic retention sweep, independent of any task's poll cadence.
pub struct Sweeper {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl Sweeper {
    /// Starts sweeping `store` every `interval`; the first sweep happens one
    /// interval after start. Stops with [`Sweeper::stop`] or store shutdown.
    /// Intervals shorter than [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn spawn(store: TaskStore, interval: Duration) -> Self {
        let interval = interval.max(MIN_SWEEP_INTERVAL);
        let token = store.shutdown_token().child_token();
        let stop = token.clone();
        let join = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        store.sweep().await;
                    }
                }
            }
            tracing::debug!(target: "codelib.task", stage = "task.sweep.stopped");
        });
        Self { token, join }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub async fn join(self) {
        self.token.cancel();
        let _ = self.join.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskId, TaskInfo, TaskStatus};
    use chrono::{DateTime, Utc};
    use std::sync::{Arc, Mutex};

    fn manual_clock(start: DateTime<Utc>) -> (Arc<Mutex<DateTime<Utc>>>, TaskStore) {
        let now = Arc::new(Mutex::new(start));
        let reader = now.clone();
        let store = TaskStore::with_clock(
            chrono::Duration::hours(1),
            Arc::new(move || *reader.lock().unwrap()),
        );
        (now, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_stale_terminal_tasks_on_tick() {
        let start = Utc::now();
        let (now, store) = manual_clock(start);
        store
            .upsert(TaskId::new("done"), TaskStatus::Success, TaskInfo::Empty)
            .await;
        store
            .upsert(TaskId::new("busy"), TaskStatus::Progress, TaskInfo::Empty)
            .await;

        let sweeper = Sweeper::spawn(store.clone(), DEFAULT_SWEEP_INTERVAL);
        *now.lock().unwrap() = start + chrono::Duration::hours(2);

        tokio::time::sleep(DEFAULT_SWEEP_INTERVAL + Duration::from_secs(1)).await;

        assert!(store.get(&TaskId::new("done")).await.is_none());
        assert!(store.get(&TaskId::new("busy")).await.is_some());
        sweeper.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_raised_to_minimum() {
        let start = Utc::now();
        let (now, store) = manual_clock(start);
        store
            .upsert(TaskId::new("done"), TaskStatus::Success, TaskInfo::Empty)
            .await;

        let sweeper = Sweeper::spawn(store.clone(), Duration::ZERO);
        *now.lock().unwrap() = start + chrono::Duration::hours(2);
        tokio::time::sleep(MIN_SWEEP_INTERVAL + Duration::from_millis(10)).await;

        assert!(!sweeper.join.is_finished());
        assert!(store.get(&TaskId::new("done")).await.is_none());
        sweeper.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_on_shutdown() {
        let store = TaskStore::default();
        let sweeper = Sweeper::spawn(store.clone(), DEFAULT_SWEEP_INTERVAL);
        store.shutdown();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(sweeper.join.is_finished());
    }
}
