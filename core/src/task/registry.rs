use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::types::{Task, TaskId, TaskInfo, TaskLabel, TaskStatus};
use crate::backend::StatusReport;

pub const DEFAULT_RETENTION_SECS: i64 = 60 * 60;

/// In-memory record of every tracked task.
///
/// Plain state with explicit timestamps; sharing and notifications live in
/// [`super::TaskStore`].
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: HashMap<TaskId, Task>,
    retention: Duration,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskSummary {
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::with_retention(Duration::seconds(DEFAULT_RETENTION_SECS))
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            tasks: HashMap::new(),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn upsert(
        &mut self,
        id: TaskId,
        status: TaskStatus,
        info: TaskInfo,
        now: DateTime<Utc>,
    ) -> Upsert {
        self.upsert_raw(id, status, status.as_wire().to_string(), info, now)
    }

    /// Applies a status response, keeping the backend's spelling alongside the normalised state.
    pub fn apply_report(&mut self, id: TaskId, report: StatusReport, now: DateTime<Utc>) -> Upsert {
        let (status, info) = match TaskStatus::parse_wire(&report.status) {
            Some(status) => (status, TaskInfo::from_value(report.info)),
            None => (
                TaskStatus::Error,
                TaskInfo::unrecognized(report.status.clone(), report.info),
            ),
        };
        self.upsert_raw(id, status, report.status, info, now)
    }

    fn upsert_raw(
        &mut self,
        id: TaskId,
        status: TaskStatus,
        wire_status: String,
        info: TaskInfo,
        now: DateTime<Utc>,
    ) -> Upsert {
        if let Some(task) = self.tasks.get_mut(&id) {
            task.status = status;
            task.wire_status = wire_status;
            task.info = info;
            task.last_updated = now;
            return Upsert::Updated;
        }
        self.tasks.insert(
            id.clone(),
            Task {
                id,
                status,
                wire_status,
                info,
                label: None,
                last_updated: now,
            },
        );
        Upsert::Inserted
    }

    pub fn set_label(&mut self, id: &TaskId, label: TaskLabel) -> bool {
        match self.tasks.get_mut(id) {
            Some(task) => {
                task.label = Some(label);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        self.tasks.remove(id)
    }

    /// Drops terminal tasks idle for longer than the retention window.
    /// Active tasks stay regardless of age.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Vec<TaskId> {
        let retention = self.retention;
        let mut expired: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.status.is_terminal() && now - t.last_updated > retention)
            .map(|t| t.id.clone())
            .collect();
        expired.sort();
        for id in &expired {
            self.tasks.remove(id);
        }
        expired
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| a.id.cmp(&b.id))
        });
        tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn summary(&self) -> TaskSummary {
        let mut summary = TaskSummary::default();
        for task in self.tasks.values() {
            match task.status {
                TaskStatus::Pending | TaskStatus::Started | TaskStatus::Progress => {
                    summary.running += 1
                }
                TaskStatus::Success => summary.completed += 1,
                TaskStatus::Failure | TaskStatus::Error => summary.failed += 1,
            }
        }
        summary
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}
