//! User-facing workflows over one backend, task store and selection.
//!
//! Every operation checks its client-side preconditions before touching the
//! network, flips the loading indicator around requests, and reports the
//! result through the [`Notifier`].

mod settings;

use std::sync::Arc;

use serde::Serialize;

pub use settings::WorkbenchSettings;

use crate::backend::{
    ChunkId, ChunkRef, CompleteOutcome, CreatedTemplate, IndexerBackend, IngestRequest,
    MergeRequest, MergeResult, NewTemplate, SearchQuery, SplitRequest, SplitResult,
    TemplateDetail, TemplateId, TemplateSummary,
};
use crate::error::{ClientError, WorkbenchError};
use crate::notify::{Notifier, Severity};
use crate::selection::SelectionSet;
use crate::task::{PollHandle, PollOutcome, Poller, Sweeper, Task, TaskId, TaskLabel, TaskStore};
use crate::template::{
    extract_from, AppliedTemplate, ParameterSchema, ParameterValues, TemplateApplier,
};

const INGEST_TASK_KIND: &str = "code_processing";

/// A template fetched for application, with its parameters ready to fill in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedTemplate {
    pub detail: TemplateDetail,
    pub schema: ParameterSchema,
    pub values: ParameterValues,
}

impl LoadedTemplate {
    pub fn new(detail: TemplateDetail) -> Self {
        let schema = extract_from(&detail.chunks);
        let values = ParameterValues::for_schema(&schema);
        Self {
            detail,
            schema,
            values,
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), ClientError> {
        self.values.set(name, value)
    }
}

pub struct Workbench {
    backend: Arc<dyn IndexerBackend>,
    notifier: Arc<dyn Notifier>,
    settings: WorkbenchSettings,
    tasks: TaskStore,
    poller: Poller,
    applier: TemplateApplier,
    selection: SelectionSet,
    candidates: Vec<ChunkRef>,
    sweeper: Option<Sweeper>,
}

impl Workbench {
    pub fn new(
        backend: Arc<dyn IndexerBackend>,
        notifier: Arc<dyn Notifier>,
        settings: WorkbenchSettings,
    ) -> Self {
        let tasks = TaskStore::new(settings.retention);
        Self::with_store(backend, notifier, settings, tasks)
    }

    pub fn with_store(
        backend: Arc<dyn IndexerBackend>,
        notifier: Arc<dyn Notifier>,
        settings: WorkbenchSettings,
        tasks: TaskStore,
    ) -> Self {
        let poller = Poller::new(
            backend.clone(),
            tasks.clone(),
            notifier.clone(),
            settings.poll_interval,
        );
        let applier = TemplateApplier::new(backend.clone());
        Self {
            backend,
            notifier,
            settings,
            tasks,
            poller,
            applier,
            selection: SelectionSet::new(),
            candidates: Vec::new(),
            sweeper: None,
        }
    }

    /// Starts the periodic retention sweep. Must run inside a tokio runtime.
    pub fn start_sweeper(&mut self) {
        if self.sweeper.is_none() {
            self.sweeper = Some(Sweeper::spawn(
                self.tasks.clone(),
                self.settings.sweep_interval,
            ));
        }
    }

    /// Stops the sweeper and every poll chain.
    pub fn shutdown(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.stop();
        }
        self.tasks.shutdown();
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn candidates(&self) -> &[ChunkRef] {
        &self.candidates
    }

    pub fn settings(&self) -> &WorkbenchSettings {
        &self.settings
    }

    fn report<T>(&self, err: impl Into<WorkbenchError>) -> Result<T, WorkbenchError> {
        let err = err.into();
        match &err {
            WorkbenchError::Client(e) => self.notifier.notify(&e.to_string(), Severity::Warning),
            WorkbenchError::Backend(e) => {
                tracing::warn!(target: "codelib.workbench", error = %e, "backend request failed");
                self.notifier
                    .notify(&format!("Error: {}", e.user_message()), Severity::Error)
            }
        }
        Err(err)
    }

    /// Submits code for ingestion and starts tracking it.
    pub async fn submit_ingest(&self, request: IngestRequest) -> Result<PollHandle, WorkbenchError> {
        let submission = match request.into_submission() {
            Ok(s) => s,
            Err(e) => return self.report(e),
        };
        let label = TaskLabel {
            name: submission.display_name(),
            kind: INGEST_TASK_KIND.to_string(),
        };

        self.notifier.set_loading(true);
        let receipt = match self.backend.ingest(submission).await {
            Ok(r) => r,
            Err(e) => {
                self.notifier.set_loading(false);
                return self.report(e);
            }
        };
        tracing::info!(
            target: "codelib.workbench",
            task_id = %receipt.task_id,
            name = %label.name,
            "ingestion submitted"
        );
        self.notifier
            .notify("Code submitted for processing", Severity::Success);

        self.tasks.add(receipt.task_id.clone(), Some(label)).await;
        Ok(self.poller.spawn(receipt.task_id).await)
    }

    /// Waits for a poll chain to end; chunks produced by a successful task
    /// become candidates.
    pub async fn await_ingest(&mut self, handle: PollHandle) -> PollOutcome {
        let outcome = handle.wait().await;
        if let PollOutcome::Succeeded { chunks, .. } = &outcome {
            self.add_candidates(chunks.clone());
        }
        outcome
    }

    /// Resumes polling a task known only by id, e.g. one submitted elsewhere.
    pub async fn track(&self, task_id: TaskId) -> PollHandle {
        if self.tasks.get(&task_id).await.is_none() {
            self.tasks.add(task_id.clone(), None).await;
        }
        self.poller.spawn(task_id).await
    }

    /// Queries the status once, starting to track the task if it is unknown.
    pub async fn check_task(&self, task_id: &TaskId) -> Result<Task, WorkbenchError> {
        if self.tasks.get(task_id).await.is_none() {
            self.tasks.add(task_id.clone(), None).await;
        }
        self.notifier.set_loading(true);
        let result = self.backend.status(task_id).await;
        self.notifier.set_loading(false);
        let report = match result {
            Ok(r) => r,
            Err(e) => return self.report(e),
        };
        match self.tasks.apply_report(task_id, report).await {
            Some(task) => Ok(task),
            None => self.report(ClientError::UnknownTask(task_id.to_string())),
        }
    }

    pub async fn remove_task(&self, task_id: &TaskId) -> Result<Task, WorkbenchError> {
        match self.tasks.remove(task_id).await {
            Some(task) => Ok(task),
            None => self.report(ClientError::UnknownTask(task_id.to_string())),
        }
    }

    pub async fn search(&mut self, query: SearchQuery) -> Result<&[ChunkRef], WorkbenchError> {
        if query.query.trim().is_empty() {
            return self.report(ClientError::EmptyQuery);
        }
        self.notifier.set_loading(true);
        let result = self.backend.search(&query).await;
        self.notifier.set_loading(false);
        let chunks = match result {
            Ok(c) => c,
            Err(e) => return self.report(e),
        };
        self.notifier
            .notify(&format!("Found {} results", chunks.len()), Severity::Success);
        self.candidates = chunks;
        Ok(&self.candidates)
    }

    /// Loads one chunk by id and makes it a candidate.
    pub async fn fetch_chunk(&mut self, chunk_id: ChunkId) -> Result<ChunkRef, WorkbenchError> {
        self.notifier.set_loading(true);
        let result = self.backend.get_chunk(chunk_id).await;
        self.notifier.set_loading(false);
        match result {
            Ok(chunk) => {
                self.add_candidates(vec![chunk.clone()]);
                Ok(chunk)
            }
            Err(e) => self.report(e),
        }
    }

    /// Makes chunks selectable, e.g. the output of a finished ingestion.
    pub fn add_candidates(&mut self, chunks: Vec<ChunkRef>) {
        for chunk in chunks {
            match self.candidates.iter_mut().find(|c| c.id == chunk.id) {
                Some(existing) => *existing = chunk,
                None => self.candidates.push(chunk),
            }
        }
    }

    /// Toggles a candidate (or an already selected chunk) by id.
    pub fn toggle(&mut self, chunk_id: ChunkId) -> Result<bool, WorkbenchError> {
        let chunk = self
            .candidates
            .iter()
            .find(|c| c.id == chunk_id)
            .or_else(|| self.selection.get(chunk_id))
            .cloned();
        match chunk {
            Some(chunk) => Ok(self.selection.toggle(chunk)),
            None => self.report(ClientError::UnknownChunk(chunk_id)),
        }
    }

    pub fn toggle_chunk(&mut self, chunk: ChunkRef) -> bool {
        self.selection.toggle(chunk)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.notifier.notify("Selection cleared", Severity::Info);
    }

    /// Splits the single selected chunk. The selection is cleared on success.
    pub async fn split_selected(
        &mut self,
        max_tokens: u32,
        overlap: u32,
    ) -> Result<SplitResult, WorkbenchError> {
        let selected = self.selection.len();
        if selected != 1 {
            return self.report(ClientError::SplitSelection { selected });
        }
        let request = SplitRequest {
            chunk_id: self.selection.ids()[0],
            max_tokens,
            overlap,
        };

        self.notifier.set_loading(true);
        let result = self.backend.split_chunk(&request).await;
        self.notifier.set_loading(false);
        let split = match result {
            Ok(s) => s,
            Err(e) => return self.report(e),
        };
        self.notifier.notify(
            &format!("Chunk split into {} parts", split.child_ids.len()),
            Severity::Success,
        );
        self.selection.clear();
        Ok(split)
    }

    /// Merges the selected chunks in selection order. The selection is cleared on success.
    pub async fn merge_selected(
        &mut self,
        name: Option<String>,
    ) -> Result<MergeResult, WorkbenchError> {
        let selected = self.selection.len();
        if selected < 2 {
            return self.report(ClientError::MergeSelection { selected });
        }
        if !self.selection.same_language() {
            return self.report(ClientError::MixedLanguages);
        }
        let request = MergeRequest {
            chunk_ids: self.selection.ids(),
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        };

        self.notifier.set_loading(true);
        let result = self.backend.merge_chunks(&request).await;
        self.notifier.set_loading(false);
        let merged = match result {
            Ok(m) => m,
            Err(e) => return self.report(e),
        };
        self.notifier
            .notify("Chunks merged successfully", Severity::Success);
        self.selection.clear();
        Ok(merged)
    }

    /// Asks the backend to finish an incomplete chunk and refreshes local copies.
    pub async fn complete_chunk(
        &mut self,
        chunk_id: ChunkId,
    ) -> Result<CompleteOutcome, WorkbenchError> {
        self.notifier.set_loading(true);
        let result = self.backend.complete_chunk(chunk_id).await;
        self.notifier.set_loading(false);
        let outcome = match result {
            Ok(o) => o,
            Err(e) => return self.report(e),
        };
        match &outcome {
            CompleteOutcome::Completed(chunk) => {
                self.refresh_chunk(chunk);
                self.notifier
                    .notify("Chunk completed successfully", Severity::Success);
            }
            CompleteOutcome::AlreadyComplete { message, .. } => {
                self.notifier.notify(message, Severity::Info);
            }
        }
        Ok(outcome)
    }

    fn refresh_chunk(&mut self, completed: &ChunkRef) {
        let merge = |existing: &ChunkRef| ChunkRef {
            raw: completed.raw.clone(),
            incomplete: completed.incomplete,
            description: completed
                .description
                .clone()
                .or_else(|| existing.description.clone()),
            ..existing.clone()
        };
        if let Some(existing) = self.selection.get(completed.id) {
            let updated = merge(existing);
            self.selection.replace(updated);
        }
        if let Some(existing) = self.candidates.iter_mut().find(|c| c.id == completed.id) {
            *existing = merge(existing);
        }
    }

    pub async fn list_templates(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<TemplateSummary>, WorkbenchError> {
        self.notifier.set_loading(true);
        let result = self.backend.list_templates(skip, limit).await;
        self.notifier.set_loading(false);
        match result {
            Ok(t) => Ok(t),
            Err(e) => self.report(e),
        }
    }

    /// Fetches a template and derives its parameter schema.
    pub async fn load_template(
        &self,
        template_id: TemplateId,
    ) -> Result<LoadedTemplate, WorkbenchError> {
        self.notifier.set_loading(true);
        let result = self.backend.get_template(template_id).await;
        self.notifier.set_loading(false);
        match result {
            Ok(detail) => Ok(LoadedTemplate::new(detail)),
            Err(e) => self.report(e),
        }
    }

    /// Parameters a template built from the current selection would expose.
    pub fn selection_schema(&self) -> ParameterSchema {
        extract_from(self.selection.as_slice())
    }

    /// Stores the selected chunks, in selection order, as a new template.
    pub async fn create_template(
        &mut self,
        name: &str,
        description: Option<String>,
    ) -> Result<CreatedTemplate, WorkbenchError> {
        if self.selection.is_empty() {
            return self.report(ClientError::EmptyTemplateSelection);
        }
        let name = name.trim();
        if name.is_empty() {
            return self.report(ClientError::EmptyTemplateName);
        }
        let template = NewTemplate {
            name: name.to_string(),
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            chunk_ids: self.selection.ids(),
        };

        self.notifier.set_loading(true);
        let result = self.backend.create_template(&template).await;
        self.notifier.set_loading(false);
        match result {
            Ok(created) => {
                self.notifier
                    .notify("Template created successfully", Severity::Success);
                Ok(created)
            }
            Err(e) => self.report(e),
        }
    }

    pub async fn apply_template(
        &self,
        template: &LoadedTemplate,
    ) -> Result<AppliedTemplate, WorkbenchError> {
        let chunks = template.detail.ordered_chunks();
        self.notifier.set_loading(true);
        let result = self
            .applier
            .apply(template.detail.id, &chunks, &template.schema, &template.values)
            .await;
        self.notifier.set_loading(false);
        match result {
            Ok(applied) => {
                self.notifier
                    .notify("Template applied successfully", Severity::Success);
                Ok(applied)
            }
            Err(e) => self.report(e),
        }
    }
}

impl Drop for Workbench {
    fn drop(&mut self) {
        self.shutdown();
    }
}
