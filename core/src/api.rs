//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `codelib_core::api` instead of reaching into internal modules.

pub use crate::backend::{
    fetch_chunks_by_id, ChunkId, ChunkRef, CompleteOutcome, CreatedTemplate, IndexerBackend,
    IngestReceipt, IngestRequest, IngestSource, IngestSubmission, MergeRequest, MergeResult,
    NewTemplate, SearchQuery, SplitRequest, SplitResult, StatusReport, TemplateChunk,
    TemplateDetail, TemplateId, TemplateSummary, UploadFile,
};
pub use crate::config::{load_default, AppConfig, BackendConfig, LoggingConfig};
pub use crate::error::{BackendError, CliError, ClientError, TransportKind, WorkbenchError};
pub use crate::notify::{Notifier, Severity, TracingNotifier};
pub use crate::selection::SelectionSet;
pub use crate::task::{
    PollHandle, PollOutcome, Task, TaskEvent, TaskId, TaskInfo, TaskLabel, TaskStatus, TaskStore,
    TaskSummary,
};
pub use crate::template::{AppliedTemplate, ParameterSchema, ParameterValues, RenderedChunk};
pub use crate::workbench::{LoadedTemplate, Workbench, WorkbenchSettings};
