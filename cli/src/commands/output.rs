use serde::Serialize;

use codelib_core::api::{
    AppliedTemplate, ChunkRef, CliError, CompleteOutcome, LoadedTemplate, Task, TemplateSummary,
};

use super::cli::OutputFormat;

/// Writes `value` as pretty JSON, or `text` for humans.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: String) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let s = serde_json::to_string_pretty(value).map_err(anyhow::Error::from)?;
            println!("{s}");
        }
        OutputFormat::Text => {
            if !text.is_empty() {
                println!("{text}");
            }
        }
    }
    Ok(())
}

pub fn chunk_line(chunk: &ChunkRef) -> String {
    let mut line = format!("#{} [{}] {}", chunk.id, chunk.language, chunk.name);
    if chunk.incomplete {
        line.push_str(" (incomplete)");
    }
    line
}

pub fn chunk_list(chunks: &[ChunkRef]) -> String {
    chunks.iter().map(chunk_line).collect::<Vec<_>>().join("\n")
}

pub fn chunk_detail(chunk: &ChunkRef) -> String {
    let mut out = chunk_line(chunk);
    if let Some(desc) = chunk.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push('\n');
        out.push_str(desc.trim());
    }
    out.push_str("\n\n");
    out.push_str(&chunk.raw);
    out
}

pub fn task_line(task: &Task) -> String {
    let name = task
        .label
        .as_ref()
        .map(|l| l.name.as_str())
        .unwrap_or("-");
    let mut line = format!("{} {} {}", task.id, task.wire_status, name);
    let info = task.info.to_string();
    if !info.is_empty() {
        line.push_str(": ");
        line.push_str(&info);
    }
    line
}

pub fn complete_text(outcome: &CompleteOutcome) -> String {
    match outcome {
        CompleteOutcome::Completed(chunk) => chunk_detail(chunk),
        CompleteOutcome::AlreadyComplete { id, message } => format!("#{id}: {message}"),
    }
}

pub fn template_list(templates: &[TemplateSummary]) -> String {
    templates
        .iter()
        .map(|t| {
            let desc = t.description.as_deref().unwrap_or("");
            format!("#{} {} ({} chunks) {}", t.id, t.name, t.chunk_count, desc)
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn template_detail(loaded: &LoadedTemplate) -> String {
    let detail = &loaded.detail;
    let mut out = format!("#{} {}", detail.id, detail.name);
    if let Some(desc) = &detail.description {
        out.push('\n');
        out.push_str(desc);
    }
    for chunk in detail.ordered_chunks() {
        out.push_str(&format!("\n  - #{} [{}] {}", chunk.id, chunk.language, chunk.name));
    }
    let names = loaded.schema.names();
    if names.is_empty() {
        out.push_str("\nparameters: none");
    } else {
        out.push_str(&format!("\nparameters: {}", names.join(", ")));
    }
    out
}

pub fn applied_text(applied: &AppliedTemplate) -> String {
    let mut out = applied
        .rendered
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push_str(&format!(
        "\n\nstored as #{} {}",
        applied.artifact.id, applied.artifact.name
    ));
    out
}
