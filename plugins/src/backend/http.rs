use std::time::Duration;

use async_trait::async_trait;
use codelib_core::api::{
    BackendError, ChunkId, ChunkRef, CompleteOutcome, CreatedTemplate, IndexerBackend,
    IngestReceipt, IngestSource, IngestSubmission, MergeRequest, MergeResult, NewTemplate,
    ParameterValues, SearchQuery, SplitRequest, SplitResult, StatusReport, TaskId,
    TemplateDetail, TemplateId, TemplateSummary, TransportKind,
};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;

const BODY_PREVIEW_LIMIT: usize = 512;

fn transport_error(err: reqwest::Error, url: &str) -> BackendError {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_request() {
        TransportKind::Request
    } else if err.is_body() {
        TransportKind::Body
    } else if err.is_decode() {
        TransportKind::Decode
    } else {
        TransportKind::Unknown
    };
    BackendError::Transport {
        kind,
        url: url.to_string(),
        message: err.to_string(),
    }
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}

/// The backend reports failures as `{"detail": ...}`; anything else is previewed.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => preview_body(body),
        },
        _ => preview_body(body),
    }
}

async fn parse_json_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, BackendError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp.text().await.map_err(|err| transport_error(err, &url))?;

    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            url,
            detail: error_detail(&body),
        });
    }

    serde_json::from_str::<T>(&body).map_err(|err| BackendError::Decode {
        message: format!(
            "failed to decode response body: {} | body={}",
            err,
            preview_body(&body)
        ),
        url,
    })
}

fn text_part(form: Form, name: &'static str, value: Option<&str>) -> Form {
    match value {
        Some(v) => form.text(name, v.to_string()),
        None => form,
    }
}

#[derive(Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    url_ingest: String,
    url_search: String,
    url_split: String,
    url_merge: String,
    url_complete: String,
    url_templates: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout_ms: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        let normalized = base_url.trim().trim_end_matches('/').to_string();
        if normalized.is_empty() {
            anyhow::bail!("backend base_url is empty");
        }
        Ok(Self {
            http,
            url_ingest: format!("{normalized}/ingest/"),
            url_search: format!("{normalized}/search/"),
            url_split: format!("{normalized}/chunks/split/"),
            url_merge: format!("{normalized}/chunks/merge/"),
            url_complete: format!("{normalized}/chunks/complete/"),
            url_templates: format!("{normalized}/templates/"),
            base_url: normalized,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| transport_error(err, url))?;
        parse_json_response(resp).await
    }

    async fn post_form<T: DeserializeOwned>(&self, url: &str, form: Form) -> Result<T, BackendError> {
        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| transport_error(err, url))?;
        parse_json_response(resp).await
    }
}

#[async_trait]
impl IndexerBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn ingest(&self, submission: IngestSubmission) -> Result<IngestReceipt, BackendError> {
        let url = &self.url_ingest;
        let mut form = match submission.source {
            IngestSource::File(file) => {
                tracing::debug!(
                    target: "codelib.backend",
                    stage = "backend.http.ingest.in",
                    url = %url,
                    file = %file.file_name,
                    bytes = file.contents.len()
                );
                Form::new().part("file", Part::bytes(file.contents).file_name(file.file_name))
            }
            IngestSource::Code(code) => {
                tracing::debug!(
                    target: "codelib.backend",
                    stage = "backend.http.ingest.in",
                    url = %url,
                    code_len = code.len()
                );
                Form::new().text("code", code)
            }
        };
        form = text_part(form, "name", submission.name.as_deref());
        form = text_part(form, "language", submission.language.as_deref());
        form = form
            .text("max_tokens", submission.max_tokens.to_string())
            .text("overlap", submission.overlap.to_string());

        let receipt: IngestReceipt = self.post_form(url, form).await?;
        tracing::debug!(
            target: "codelib.backend",
            stage = "backend.http.ingest.out",
            task_id = %receipt.task_id
        );
        Ok(receipt)
    }

    async fn status(&self, task_id: &TaskId) -> Result<StatusReport, BackendError> {
        let url = format!("{}/status/{}", self.base_url, task_id);
        self.get_json(&url, &[]).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ChunkRef>, BackendError> {
        let url = &self.url_search;
        tracing::debug!(
            target: "codelib.backend",
            stage = "backend.http.search.in",
            url = %url,
            query_len = query.query.len(),
            limit = query.limit,
            language = ?query.language
        );
        let mut params = vec![
            ("query", query.query.clone()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(language) = &query.language {
            params.push(("language", language.clone()));
        }
        let chunks: Vec<ChunkRef> = self.get_json(url, &params).await?;
        tracing::debug!(
            target: "codelib.backend",
            stage = "backend.http.search.out",
            results = chunks.len()
        );
        Ok(chunks)
    }

    async fn get_chunk(&self, chunk_id: ChunkId) -> Result<ChunkRef, BackendError> {
        let url = format!("{}/chunks/{}", self.base_url, chunk_id);
        self.get_json(&url, &[]).await
    }

    async fn split_chunk(&self, request: &SplitRequest) -> Result<SplitResult, BackendError> {
        let form = Form::new()
            .text("chunk_id", request.chunk_id.to_string())
            .text("max_tokens", request.max_tokens.to_string())
            .text("overlap", request.overlap.to_string());
        self.post_form(&self.url_split, form).await
    }

    async fn merge_chunks(&self, request: &MergeRequest) -> Result<MergeResult, BackendError> {
        let mut form = request
            .chunk_ids
            .iter()
            .fold(Form::new(), |f, id| f.text("chunk_ids", id.to_string()));
        form = text_part(form, "name", request.name.as_deref());
        self.post_form(&self.url_merge, form).await
    }

    async fn complete_chunk(&self, chunk_id: ChunkId) -> Result<CompleteOutcome, BackendError> {
        let form = Form::new().text("chunk_id", chunk_id.to_string());
        self.post_form(&self.url_complete, form).await
    }

    async fn list_templates(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<TemplateSummary>, BackendError> {
        self.get_json(
            &self.url_templates,
            &[("skip", skip.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn get_template(&self, template_id: TemplateId) -> Result<TemplateDetail, BackendError> {
        let url = format!("{}/templates/{}", self.base_url, template_id);
        self.get_json(&url, &[]).await
    }

    async fn create_template(
        &self,
        template: &NewTemplate,
    ) -> Result<CreatedTemplate, BackendError> {
        let mut form = Form::new().text("name", template.name.clone());
        form = text_part(form, "description", template.description.as_deref());
        form = template
            .chunk_ids
            .iter()
            .fold(form, |f, id| f.text("chunk_ids", id.to_string()));
        self.post_form(&self.url_templates, form).await
    }

    async fn apply_template(
        &self,
        template_id: TemplateId,
        parameters: &ParameterValues,
    ) -> Result<ChunkRef, BackendError> {
        let url = format!("{}/templates/{}/apply/", self.base_url, template_id);
        let encoded = serde_json::to_string(parameters).map_err(|err| BackendError::Decode {
            url: url.clone(),
            message: format!("failed to encode parameters: {err}"),
        })?;
        tracing::debug!(
            target: "codelib.backend",
            stage = "backend.http.apply.in",
            url = %url,
            parameters = parameters.len()
        );
        let form = Form::new().text("parameters", encoded);
        self.post_form(&url, form).await
    }
}
