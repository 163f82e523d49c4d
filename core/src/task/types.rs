//! Task lifecycle types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::backend::ChunkId;

/// Externally assigned task identifier. The backend may send it as a string or a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

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

impl From<&str> for TaskId {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

impl From<String> for TaskId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => TaskId(s),
            Raw::Number(n) => TaskId(n.to_string()),
        })
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Started,
    Progress,
    Success,
    Failure,
    Error,
}

impl TaskStatus {
    /// Normalises the status string the backend sends.
    ///
    /// The service mixes casings (`pending`, `STARTED`, `PROGRESS`, `success`) and
    /// occasionally leaks raw queue states; those are folded onto the nearest
    /// lifecycle state. Anything unrecognised is terminal so polling cannot spin
    /// forever on it.
    pub fn from_wire(raw: &str) -> Self {
        Self::parse_wire(raw).unwrap_or(Self::Error)
    }

    /// Like [`TaskStatus::from_wire`], but `None` for strings outside the lifecycle.
    pub fn parse_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "received" => Some(Self::Pending),
            "started" => Some(Self::Started),
            "progress" | "retry" => Some(Self::Progress),
            "success" => Some(Self::Success),
            "failure" | "revoked" => Some(Self::Failure),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Spelling the backend itself uses for this state.
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Started => "STARTED",
            Self::Progress => "PROGRESS",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Started | Self::Progress)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Payload attached to a status: a diagnostic line or a structured result.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum TaskInfo {
    #[default]
    Empty,
    Message(String),
    Result(Value),
    /// Status string the client does not know, with whatever info came with it.
    Unrecognized {
        status: String,
        detail: Option<Value>,
    },
}

impl TaskInfo {
    pub fn from_value(v: Value) -> Self {
        match v {
            Value::Null => Self::Empty,
            Value::String(s) => Self::Message(s),
            other => Self::Result(other),
        }
    }

    pub fn unrecognized(status: impl Into<String>, info: Value) -> Self {
        Self::Unrecognized {
            status: status.into(),
            detail: (!info.is_null()).then_some(info),
        }
    }

    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }

    /// Chunk ids produced by a successful ingestion, if the result carries any.
    pub fn chunk_ids(&self) -> Vec<ChunkId> {
        let Self::Result(v) = self else {
            return Vec::new();
        };
        v.get("chunk_ids")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| match id {
                        Value::Number(n) => n.as_i64(),
                        Value::String(s) => s.trim().parse().ok(),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for TaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Message(s) => f.write_str(s),
            Self::Result(v) => write!(f, "{v}"),
            Self::Unrecognized { status, detail } => {
                write!(f, "unrecognized status `{status}`")?;
                match detail {
                    Some(Value::String(s)) => write!(f, ": {s}"),
                    Some(v) => write!(f, ": {v}"),
                    None => Ok(()),
                }
            }
        }
    }
}

/// What the user submitted, kept for display next to the task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskLabel {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Status exactly as last received from the backend.
    pub wire_status: String,
    pub info: TaskInfo,
    pub label: Option<TaskLabel>,
    pub last_updated: DateTime<Utc>,
}

impl Task {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Task store notifications.
#[derive(Debug, Clone, Serialize)]
pub enum TaskEvent {
    Added {
        task_id: TaskId,
        timestamp: DateTime<Utc>,
    },
    Updated {
        task_id: TaskId,
        status: TaskStatus,
        timestamp: DateTime<Utc>,
    },
    Removed {
        task_id: TaskId,
        timestamp: DateTime<Utc>,
    },
    Swept {
        task_ids: Vec<TaskId>,
        timestamp: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_from_mixed_case_wire() {
        assert_eq!(TaskStatus::from_wire("pending"), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_wire("PENDING"), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_wire("STARTED"), TaskStatus::Started);
        assert_eq!(TaskStatus::from_wire("PROGRESS"), TaskStatus::Progress);
        assert_eq!(TaskStatus::from_wire("success"), TaskStatus::Success);
        assert_eq!(TaskStatus::from_wire("failure"), TaskStatus::Failure);
        assert_eq!(TaskStatus::from_wire("error"), TaskStatus::Error);
        assert_eq!(TaskStatus::from_wire("RETRY"), TaskStatus::Progress);
        assert_eq!(TaskStatus::from_wire("bogus"), TaskStatus::Error);
        assert_eq!(TaskStatus::parse_wire("bogus"), None);
        assert_eq!(TaskStatus::parse_wire("ERROR"), Some(TaskStatus::Error));
    }

    #[test]
    fn test_status_activity() {
        for s in [TaskStatus::Pending, TaskStatus::Started, TaskStatus::Progress] {
            assert!(s.is_active());
        }
        for s in [TaskStatus::Success, TaskStatus::Failure, TaskStatus::Error] {
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn test_task_id_accepts_numbers() {
        let id: TaskId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(id.as_str(), "42");
        let id: TaskId = serde_json::from_value(json!("abc-1")).unwrap();
        assert_eq!(id.as_str(), "abc-1");
    }

    #[test]
    fn test_info_chunk_ids() {
        let info = TaskInfo::from_value(json!({"chunk_ids": [7, "8", null]}));
        assert_eq!(info.chunk_ids(), vec![7, 8]);
        assert!(TaskInfo::from_value(json!("Task is pending execution"))
            .chunk_ids()
            .is_empty());
        assert_eq!(TaskInfo::from_value(Value::Null), TaskInfo::Empty);
    }
}
