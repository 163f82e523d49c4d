use thiserror::Error;

use super::backend::BackendError;
use crate::backend::ChunkId;

/// Failures detected on the client before any request leaves the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("please provide code input or upload a file")]
    EmptySubmission,
    #[error("please enter a search query")]
    EmptyQuery,
    #[error("select exactly one chunk to split ({selected} selected)")]
    SplitSelection { selected: usize },
    #[error("select at least two chunks to merge ({selected} selected)")]
    MergeSelection { selected: usize },
    #[error("all chunks must have the same language to merge")]
    MixedLanguages,
    #[error("please enter a template name")]
    EmptyTemplateName,
    #[error("select at least one chunk to create a template")]
    EmptyTemplateSelection,
    #[error("please fill in all parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("chunk {0} is not among the current candidates")]
    UnknownChunk(ChunkId),
    #[error("task {0} is not tracked")]
    UnknownTask(String),
}

#[derive(Error, Debug)]
pub enum WorkbenchError {
    #[error("{0}")]
    Client(#[from] ClientError),
    #[error("{0}")]
    Backend(#[from] BackendError),
}

impl WorkbenchError {
    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client(_))
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Workbench(#[from] WorkbenchError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameters_lists_names() {
        let err = ClientError::MissingParameters(vec!["x".into(), "y".into()]);
        assert_eq!(err.to_string(), "please fill in all parameters: x, y");
    }

    #[test]
    fn test_cli_error_keeps_workbench_message() {
        let err: CliError = WorkbenchError::from(ClientError::MixedLanguages).into();
        assert_eq!(
            err.to_string(),
            "all chunks must have the same language to merge"
        );
    }

    #[test]
    fn test_workbench_error_wraps_client() {
        let err: WorkbenchError = ClientError::EmptyQuery.into();
        assert!(err.is_client());
        assert_eq!(err.to_string(), "please enter a search query");
    }
}
