pub mod poller;
pub mod registry;
pub mod store;
pub mod sweeper;
pub mod types;

pub use poller::{PollHandle, PollOutcome, Poller, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL};
pub use registry::{TaskRegistry, TaskSummary, Upsert, DEFAULT_RETENTION_SECS};
pub use store::{Clock, PollLease, TaskStore};
pub use sweeper::{Sweeper, DEFAULT_SWEEP_INTERVAL, MIN_SWEEP_INTERVAL};
pub use types::{Task, TaskEvent, TaskId, TaskInfo, TaskLabel, TaskStatus};
