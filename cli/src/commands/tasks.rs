use tokio::io::AsyncReadExt;

use codelib_core::api::{CliError, IngestRequest, PollOutcome, TaskId, Workbench, WorkbenchError};

use super::cli::{IngestArgs, OutputFormat, StatusArgs};
use super::output;
use crate::utils::load_upload;

pub async fn ingest(
    wb: &mut Workbench,
    args: IngestArgs,
    format: OutputFormat,
) -> Result<i32, CliError> {
    let code = if args.stdin {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        Some(buf)
    } else {
        args.code
    };
    let file = args.file.as_deref().map(load_upload).transpose()?;
    let settings = wb.settings().clone();
    let request = IngestRequest {
        code,
        file,
        name: args.name,
        language: args.language,
        max_tokens: args.max_tokens.unwrap_or(settings.max_tokens),
        overlap: args.overlap.unwrap_or(settings.overlap),
    };

    let handle = wb.submit_ingest(request).await?;
    if args.no_wait {
        handle.stop();
        let task_id = handle.task_id().clone();
        output::emit(format, &task_id, task_id.to_string())?;
        return Ok(0);
    }
    let outcome = wb.await_ingest(handle).await;
    finish(outcome, format)
}

pub async fn status(
    wb: &mut Workbench,
    args: StatusArgs,
    format: OutputFormat,
) -> Result<i32, CliError> {
    let task_id = TaskId::new(args.task_id);
    if !args.watch {
        let task = wb.check_task(&task_id).await?;
        output::emit(format, &task, output::task_line(&task))?;
        return Ok(0);
    }
    let handle = wb.track(task_id).await;
    let outcome = wb.await_ingest(handle).await;
    finish(outcome, format)
}

/// Prints what a finished poll chain produced and picks the exit code.
fn finish(outcome: PollOutcome, format: OutputFormat) -> Result<i32, CliError> {
    match outcome {
        PollOutcome::Succeeded { task, chunks } => {
            tracing::info!(
                target: "codelib.cli",
                task_id = %task.id,
                chunks = chunks.len(),
                "ingestion finished"
            );
            output::emit(format, &chunks, output::chunk_list(&chunks))?;
            Ok(0)
        }
        PollOutcome::FetchFailed { error, .. } => Err(WorkbenchError::from(error).into()),
        PollOutcome::Failed { task } => {
            output::emit(format, &task, output::task_line(&task))?;
            Ok(1)
        }
        PollOutcome::Removed | PollOutcome::Stopped => Ok(1),
    }
}
