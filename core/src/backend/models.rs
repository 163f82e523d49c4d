use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::task::TaskId;

pub type ChunkId = i64;
pub type TemplateId = i64;

/// Read-only projection of a stored chunk as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    pub id: ChunkId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub raw: String,
    #[serde(default)]
    pub incomplete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestSource {
    Code(String),
    File(UploadFile),
}

/// Ingestion form as the user fills it in; either field may be missing.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub code: Option<String>,
    pub file: Option<UploadFile>,
    pub name: Option<String>,
    pub language: Option<String>,
    pub max_tokens: u32,
    pub overlap: u32,
}

/// Validated ingestion payload, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSubmission {
    pub source: IngestSource,
    pub name: Option<String>,
    pub language: Option<String>,
    pub max_tokens: u32,
    pub overlap: u32,
}

impl IngestRequest {
    /// A file wins over pasted code, matching the upload form.
    pub fn into_submission(self) -> Result<IngestSubmission, ClientError> {
        let source = match (self.file, self.code) {
            (Some(file), _) => IngestSource::File(file),
            (None, Some(code)) if !code.trim().is_empty() => IngestSource::Code(code),
            _ => return Err(ClientError::EmptySubmission),
        };
        Ok(IngestSubmission {
            source,
            name: non_blank(self.name),
            language: non_blank(self.language),
            max_tokens: self.max_tokens,
            overlap: self.overlap,
        })
    }
}

impl IngestSubmission {
    /// Name recorded on the tracked task.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match &self.source {
            IngestSource::File(file) => file.file_name.clone(),
            IngestSource::Code(_) => "Code snippet".to_string(),
        }
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub task_id: TaskId,
    #[serde(default)]
    pub status: Option<String>,
}

/// Raw `GET /status/{id}` body; `status` keeps the backend's spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: String,
    #[serde(default)]
    pub info: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub limit: u32,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRequest {
    pub chunk_id: ChunkId,
    pub max_tokens: u32,
    pub overlap: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResult {
    pub parent_id: ChunkId,
    pub child_ids: Vec<ChunkId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub chunk_ids: Vec<ChunkId>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub id: ChunkId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_ids: Vec<ChunkId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompleteOutcome {
    AlreadyComplete { id: ChunkId, message: String },
    Completed(ChunkRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub chunk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateChunk {
    pub id: ChunkId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDetail {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub chunks: Vec<TemplateChunk>,
}

impl TemplateDetail {
    /// Chunks in template order; chunks without a position keep their place at the end.
    pub fn ordered_chunks(&self) -> Vec<&TemplateChunk> {
        let mut chunks: Vec<&TemplateChunk> = self.chunks.iter().collect();
        chunks.sort_by_key(|c| c.position.unwrap_or(i64::MAX));
        chunks
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    pub name: String,
    pub description: Option<String>,
    pub chunk_ids: Vec<ChunkId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub chunk_ids: Vec<ChunkId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_request_requires_code_or_file() {
        let req = IngestRequest {
            code: Some("   ".into()),
            max_tokens: 1000,
            overlap: 50,
            ..Default::default()
        };
        assert_eq!(req.into_submission(), Err(ClientError::EmptySubmission));
        assert_eq!(
            IngestRequest::default().into_submission(),
            Err(ClientError::EmptySubmission)
        );
    }

    #[test]
    fn test_ingest_request_prefers_file() {
        let req = IngestRequest {
            code: Some("print(1)".into()),
            file: Some(UploadFile {
                file_name: "main.py".into(),
                contents: b"print(2)".to_vec(),
            }),
            name: Some("  ".into()),
            ..Default::default()
        };
        let sub = req.into_submission().unwrap();
        assert!(matches!(sub.source, IngestSource::File(_)));
        assert_eq!(sub.name, None);
        assert_eq!(sub.display_name(), "main.py");
    }

    #[test]
    fn test_complete_outcome_variants() {
        let done: CompleteOutcome =
            serde_json::from_str(r#"{"id":3,"message":"Chunk is already complete"}"#).unwrap();
        assert!(matches!(done, CompleteOutcome::AlreadyComplete { id: 3, .. }));

        let completed: CompleteOutcome = serde_json::from_str(
            r#"{"id":3,"name":"f","language":"rust","description":"d","raw":"fn f() {}","incomplete":false}"#,
        )
        .unwrap();
        match completed {
            CompleteOutcome::Completed(chunk) => assert_eq!(chunk.raw, "fn f() {}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_template_ordered_chunks() {
        let detail: TemplateDetail = serde_json::from_str(
            r#"{"id":1,"name":"t","chunks":[
                {"id":5,"name":"b","language":"py","position":1},
                {"id":4,"name":"a","language":"py","position":0}
            ]}"#,
        )
        .unwrap();
        let ids: Vec<_> = detail.ordered_chunks().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![4, 5]);
    }
}
