use codelib_core::api::{ChunkId, CliError, SearchQuery, Workbench};

use super::cli::{CompleteArgs, MergeArgs, OutputFormat, SearchArgs, ShowArgs, SplitArgs};
use super::output;

pub async fn search(
    wb: &mut Workbench,
    args: SearchArgs,
    format: OutputFormat,
) -> Result<i32, CliError> {
    let query = SearchQuery {
        query: args.query,
        limit: args.limit.unwrap_or(wb.settings().search_limit),
        language: args.language.filter(|l| !l.trim().is_empty()),
    };
    let chunks = wb.search(query).await?;
    output::emit(format, &chunks, output::chunk_list(chunks))?;
    Ok(0)
}

pub async fn show(wb: &mut Workbench, args: ShowArgs, format: OutputFormat) -> Result<i32, CliError> {
    let chunk = wb.fetch_chunk(args.chunk_id).await?;
    output::emit(format, &chunk, output::chunk_detail(&chunk))?;
    Ok(0)
}

/// Loads the given chunks and selects them in order; repeated ids are selected once.
pub async fn select(wb: &mut Workbench, ids: &[ChunkId]) -> Result<(), CliError> {
    for &id in ids {
        if wb.selection().contains(id) {
            continue;
        }
        wb.fetch_chunk(id).await?;
        wb.toggle(id)?;
    }
    Ok(())
}

pub async fn split(wb: &mut Workbench, args: SplitArgs, format: OutputFormat) -> Result<i32, CliError> {
    select(wb, &[args.chunk_id]).await?;
    let settings = wb.settings().clone();
    let result = wb
        .split_selected(
            args.max_tokens.unwrap_or(settings.max_tokens),
            args.overlap.unwrap_or(settings.overlap),
        )
        .await?;
    let text = result
        .child_ids
        .iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(" ");
    output::emit(format, &result, text)?;
    Ok(0)
}

pub async fn merge(wb: &mut Workbench, args: MergeArgs, format: OutputFormat) -> Result<i32, CliError> {
    select(wb, &args.chunk_ids).await?;
    let merged = wb.merge_selected(args.name).await?;
    let text = format!("#{} {}", merged.id, merged.name);
    output::emit(format, &merged, text)?;
    Ok(0)
}

pub async fn complete(
    wb: &mut Workbench,
    args: CompleteArgs,
    format: OutputFormat,
) -> Result<i32, CliError> {
    let outcome = wb.complete_chunk(args.chunk_id).await?;
    output::emit(format, &outcome, output::complete_text(&outcome))?;
    Ok(0)
}
