#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use codelib_core::api::{
    BackendError, ChunkId, ChunkRef, CompleteOutcome, CreatedTemplate, IndexerBackend,
    IngestReceipt, IngestSubmission, MergeRequest, MergeResult, NewTemplate, Notifier,
    ParameterValues, SearchQuery, Severity, SplitRequest, SplitResult, StatusReport, TaskId,
    TemplateChunk, TemplateDetail, TemplateId, TemplateSummary, TransportKind,
};

pub fn chunk(id: ChunkId, language: &str, raw: &str) -> ChunkRef {
    ChunkRef {
        id,
        name: format!("chunk-{id}"),
        language: language.to_string(),
        raw: raw.to_string(),
        incomplete: false,
        description: None,
        created_at: None,
    }
}

pub fn report(status: &str, info: Value) -> Result<StatusReport, BackendError> {
    Ok(StatusReport {
        status: status.to_string(),
        info,
    })
}

pub fn transport_error(message: &str) -> BackendError {
    BackendError::Transport {
        kind: TransportKind::Connect,
        url: "http://scripted/status".to_string(),
        message: message.to_string(),
    }
}

#[derive(Default)]
struct State {
    calls: Vec<String>,
    next_task: u32,
    statuses: HashMap<String, VecDeque<Result<StatusReport, BackendError>>>,
    chunks: Vec<ChunkRef>,
    templates: HashMap<TemplateId, TemplateDetail>,
    applied: Vec<(TemplateId, ParameterValues)>,
    next_id: ChunkId,
}

/// In-memory backend driven by per-task status scripts.
///
/// A script's last entry repeats once the queue runs dry.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<State>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().next_id = 1000;
        backend
    }

    pub fn script(&self, task_id: &str, steps: Vec<Result<StatusReport, BackendError>>) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(task_id.to_string(), steps.into());
    }

    pub fn add_chunk(&self, chunk: ChunkRef) {
        self.state.lock().unwrap().chunks.push(chunk);
    }

    pub fn add_template(&self, template: TemplateDetail) {
        self.state
            .lock()
            .unwrap()
            .templates
            .insert(template.id, template);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn applied(&self) -> Vec<(TemplateId, ParameterValues)> {
        self.state.lock().unwrap().applied.clone()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn not_found(what: &str) -> BackendError {
        BackendError::Status {
            status: 404,
            url: format!("http://scripted/{what}"),
            detail: format!("{what} not found"),
        }
    }
}

#[async_trait]
impl IndexerBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn ingest(&self, submission: IngestSubmission) -> Result<IngestReceipt, BackendError> {
        self.record(format!("ingest {}", submission.display_name()));
        let mut state = self.state.lock().unwrap();
        state.next_task += 1;
        Ok(IngestReceipt {
            task_id: TaskId::new(format!("task-{}", state.next_task)),
            status: Some("pending".to_string()),
        })
    }

    async fn status(&self, task_id: &TaskId) -> Result<StatusReport, BackendError> {
        self.record(format!("status {task_id}"));
        let mut state = self.state.lock().unwrap();
        let Some(queue) = state.statuses.get_mut(task_id.as_str()) else {
            return report("pending", Value::Null);
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(|| report("pending", Value::Null))
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| report("pending", Value::Null))
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ChunkRef>, BackendError> {
        self.record(format!("search {} limit={}", query.query, query.limit));
        let state = self.state.lock().unwrap();
        let hits: Vec<ChunkRef> = match query.query.strip_prefix("id:") {
            Some(ids) => {
                let ids: Vec<ChunkId> = ids.split(',').filter_map(|s| s.parse().ok()).collect();
                state
                    .chunks
                    .iter()
                    .filter(|c| ids.contains(&c.id))
                    .cloned()
                    .collect()
            }
            None => state
                .chunks
                .iter()
                .filter(|c| c.raw.contains(&query.query))
                .cloned()
                .collect(),
        };
        Ok(hits.into_iter().take(query.limit as usize).collect())
    }

    async fn get_chunk(&self, chunk_id: ChunkId) -> Result<ChunkRef, BackendError> {
        self.record(format!("get_chunk {chunk_id}"));
        let state = self.state.lock().unwrap();
        state
            .chunks
            .iter()
            .find(|c| c.id == chunk_id)
            .cloned()
            .ok_or_else(|| Self::not_found("chunk"))
    }

    async fn split_chunk(&self, request: &SplitRequest) -> Result<SplitResult, BackendError> {
        self.record(format!("split {}", request.chunk_id));
        let mut state = self.state.lock().unwrap();
        let first = state.next_id;
        state.next_id += 2;
        Ok(SplitResult {
            parent_id: request.chunk_id,
            child_ids: vec![first, first + 1],
        })
    }

    async fn merge_chunks(&self, request: &MergeRequest) -> Result<MergeResult, BackendError> {
        self.record(format!("merge {:?}", request.chunk_ids));
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        Ok(MergeResult {
            id,
            name: request.name.clone().unwrap_or_else(|| "merged".to_string()),
            parent_ids: request.chunk_ids.clone(),
        })
    }

    async fn complete_chunk(&self, chunk_id: ChunkId) -> Result<CompleteOutcome, BackendError> {
        self.record(format!("complete {chunk_id}"));
        let mut state = self.state.lock().unwrap();
        let chunk = state
            .chunks
            .iter_mut()
            .find(|c| c.id == chunk_id)
            .ok_or_else(|| Self::not_found("chunk"))?;
        if !chunk.incomplete {
            return Ok(CompleteOutcome::AlreadyComplete {
                id: chunk_id,
                message: "Chunk is already complete".to_string(),
            });
        }
        chunk.incomplete = false;
        chunk.raw.push_str("\n}");
        Ok(CompleteOutcome::Completed(chunk.clone()))
    }

    async fn list_templates(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<TemplateSummary>, BackendError> {
        self.record(format!("list_templates skip={skip} limit={limit}"));
        let state = self.state.lock().unwrap();
        let mut out: Vec<TemplateSummary> = state
            .templates
            .values()
            .map(|t| TemplateSummary {
                id: t.id,
                name: t.name.clone(),
                description: t.description.clone(),
                created_at: t.created_at.clone(),
                chunk_count: t.chunks.len(),
            })
            .collect();
        out.sort_by_key(|t| t.id);
        Ok(out
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get_template(&self, template_id: TemplateId) -> Result<TemplateDetail, BackendError> {
        self.record(format!("get_template {template_id}"));
        let state = self.state.lock().unwrap();
        state
            .templates
            .get(&template_id)
            .cloned()
            .ok_or_else(|| Self::not_found("template"))
    }

    async fn create_template(
        &self,
        template: &NewTemplate,
    ) -> Result<CreatedTemplate, BackendError> {
        self.record(format!("create_template {}", template.name));
        let mut state = self.state.lock().unwrap();
        let id = state.templates.len() as TemplateId + 1;
        let chunks = template
            .chunk_ids
            .iter()
            .enumerate()
            .filter_map(|(pos, cid)| {
                state.chunks.iter().find(|c| c.id == *cid).map(|c| TemplateChunk {
                    id: c.id,
                    name: c.name.clone(),
                    language: c.language.clone(),
                    description: c.description.clone(),
                    raw: Some(c.raw.clone()),
                    position: Some(pos as i64),
                })
            })
            .collect();
        state.templates.insert(
            id,
            TemplateDetail {
                id,
                name: template.name.clone(),
                description: template.description.clone(),
                created_at: None,
                chunks,
            },
        );
        Ok(CreatedTemplate {
            id,
            name: template.name.clone(),
            description: template.description.clone(),
            chunk_ids: template.chunk_ids.clone(),
        })
    }

    async fn apply_template(
        &self,
        template_id: TemplateId,
        parameters: &ParameterValues,
    ) -> Result<ChunkRef, BackendError> {
        self.record(format!("apply_template {template_id}"));
        let mut state = self.state.lock().unwrap();
        if !state.templates.contains_key(&template_id) {
            return Err(Self::not_found("template"));
        }
        state.applied.push((template_id, parameters.clone()));
        let id = state.next_id;
        state.next_id += 1;
        Ok(ChunkRef {
            description: Some(json!(parameters).to_string()),
            ..chunk(id, "python", "applied")
        })
    }
}

/// Notifier that keeps everything it was told.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<(Severity, String)>>>,
    loading: Arc<Mutex<Vec<bool>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|(_, m)| m).collect()
    }

    pub fn has(&self, severity: Severity, needle: &str) -> bool {
        self.messages()
            .iter()
            .any(|(s, m)| *s == severity && m.contains(needle))
    }

    pub fn loading_history(&self) -> Vec<bool> {
        self.loading.lock().unwrap().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.lock().unwrap().last().copied().unwrap_or(false)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
    }

    fn set_loading(&self, loading: bool) {
        self.loading.lock().unwrap().push(loading);
    }
}
