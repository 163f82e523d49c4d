pub mod models;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::task::TaskId;
use crate::template::ParameterValues;

pub use models::{
    ChunkId, ChunkRef, CompleteOutcome, CreatedTemplate, IngestReceipt, IngestRequest,
    IngestSource, IngestSubmission, MergeRequest, MergeResult, NewTemplate, SearchQuery,
    SplitRequest, SplitResult, StatusReport, TemplateChunk, TemplateDetail, TemplateId,
    TemplateSummary, UploadFile,
};

/// The indexing service as seen by the client. Every call is one request.
#[async_trait]
pub trait IndexerBackend: Send + Sync {
    fn name(&self) -> &str;
    async fn ingest(&self, submission: IngestSubmission) -> Result<IngestReceipt, BackendError>;
    async fn status(&self, task_id: &TaskId) -> Result<StatusReport, BackendError>;
    async fn search(&self, query: &SearchQuery) -> Result<Vec<ChunkRef>, BackendError>;
    async fn get_chunk(&self, chunk_id: ChunkId) -> Result<ChunkRef, BackendError>;
    async fn split_chunk(&self, request: &SplitRequest) -> Result<SplitResult, BackendError>;
    async fn merge_chunks(&self, request: &MergeRequest) -> Result<MergeResult, BackendError>;
    async fn complete_chunk(&self, chunk_id: ChunkId) -> Result<CompleteOutcome, BackendError>;
    async fn list_templates(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<TemplateSummary>, BackendError>;
    async fn get_template(&self, template_id: TemplateId) -> Result<TemplateDetail, BackendError>;
    async fn create_template(&self, template: &NewTemplate)
        -> Result<CreatedTemplate, BackendError>;
    async fn apply_template(
        &self,
        template_id: TemplateId,
        parameters: &ParameterValues,
    ) -> Result<ChunkRef, BackendError>;
}

/// Looks up freshly produced chunks through the search endpoint.
///
/// The backend has no batch lookup, so this asks for `id:<a>,<b>` with some
/// headroom and keeps only the exact ids requested, in request order.
pub async fn fetch_chunks_by_id(
    backend: &dyn IndexerBackend,
    chunk_ids: &[ChunkId],
) -> Result<Vec<ChunkRef>, BackendError> {
    if chunk_ids.is_empty() {
        return Ok(Vec::new());
    }
    let joined = chunk_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let query = SearchQuery {
        query: format!("id:{joined}"),
        limit: (chunk_ids.len() as u32).saturating_mul(2),
        language: None,
    };
    let found = backend.search(&query).await?;
    tracing::debug!(
        target: "codelib.backend",
        stage = "backend.fetch_by_id",
        requested = chunk_ids.len(),
        returned = found.len()
    );
    Ok(chunk_ids
        .iter()
        .filter_map(|id| found.iter().find(|c| c.id == *id).cloned())
        .collect())
}
