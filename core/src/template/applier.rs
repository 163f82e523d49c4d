use std::sync::Arc;

use serde::Serialize;

use super::params::{placeholder_regex, ParameterSchema, ParameterValues};
use crate::backend::{ChunkId, ChunkRef, IndexerBackend, TemplateChunk, TemplateId};
use crate::error::{ClientError, WorkbenchError};

/// Schema names with no usable value, in schema order.
pub fn validate(schema: &ParameterSchema, values: &ParameterValues) -> Vec<String> {
    schema
        .names()
        .iter()
        .filter(|name| values.get(name).map_or(true, str::is_empty))
        .cloned()
        .collect()
}

/// Replaces each `{{$name}}` that has a value with that value, verbatim.
///
/// Single pass: inserted text is never scanned again, and placeholders without
/// a value are left untouched.
pub fn substitute(text: &str, values: &ParameterValues) -> String {
    placeholder_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| match values.get(&caps[1]) {
            Some(v) => v.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedChunk {
    pub chunk_id: ChunkId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedTemplate {
    /// Local substitution of every template chunk, in template order.
    pub rendered: Vec<RenderedChunk>,
    /// What the backend stored for this application.
    pub artifact: ChunkRef,
}

pub fn render(chunks: &[&TemplateChunk], values: &ParameterValues) -> Vec<RenderedChunk> {
    chunks
        .iter()
        .map(|chunk| {
            let source = chunk
                .raw
                .as_deref()
                .or(chunk.description.as_deref())
                .unwrap_or_default();
            RenderedChunk {
                chunk_id: chunk.id,
                text: substitute(source, values),
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct TemplateApplier {
    backend: Arc<dyn IndexerBackend>,
}

impl TemplateApplier {
    pub fn new(backend: Arc<dyn IndexerBackend>) -> Self {
        Self { backend }
    }

    /// Validates, renders locally, then asks the backend to apply the template.
    /// Nothing is sent while any schema name lacks a value.
    pub async fn apply(
        &self,
        template_id: TemplateId,
        chunks: &[&TemplateChunk],
        schema: &ParameterSchema,
        values: &ParameterValues,
    ) -> Result<AppliedTemplate, WorkbenchError> {
        let missing = validate(schema, values);
        if !missing.is_empty() {
            return Err(ClientError::MissingParameters(missing).into());
        }

        let rendered = render(chunks, values);
        tracing::debug!(
            target: "codelib.template",
            stage = "template.apply",
            template_id = template_id,
            chunks = rendered.len(),
            parameters = values.len()
        );
        let artifact = self.backend.apply_template(template_id, values).await?;
        Ok(AppliedTemplate { rendered, artifact })
    }
}
