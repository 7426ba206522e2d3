//! Question endpoints: the HTML form flow and its JSON twin.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pdfqa_ingest::{ensure_pdf_filename, IndexError};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::pages;
use crate::pipeline::{Answer, PipelineError, QaPipeline};
use crate::state::AppState;

const MISSING_KEY_MESSAGE: &str = "Please set your OpenAI API key in a .env file or the environment.";

/// Fields read from the multipart form.
#[derive(Default)]
struct AskForm {
    filename: Option<String>,
    bytes: Vec<u8>,
    question: String,
}

async fn read_form(mut multipart: Multipart) -> Result<AskForm, (StatusCode, String)> {
    let mut form = AskForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                form.filename = field.file_name().map(str::to_string);
                form.bytes = field
                    .bytes()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read file: {e}")))?
                    .to_vec();
            }
            Some("question") => {
                form.question = field
                    .text()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read question: {e}")))?
                    .trim()
                    .to_string();
            }
            _ => {}
        }
    }
    Ok(form)
}

/// The upload must be present, non-empty, and named `*.pdf`.
fn check_upload(form: &AskForm) -> Result<&str, (StatusCode, String)> {
    let filename = form
        .filename
        .as_deref()
        .filter(|name| !name.is_empty() && !form.bytes.is_empty())
        .ok_or((StatusCode::BAD_REQUEST, "Please upload a PDF file.".to_string()))?;
    ensure_pdf_filename(filename)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Only PDF files are accepted ({e}).")))?;
    Ok(filename)
}

/// HTTP status for a failed run: unreadable input is the client's problem,
/// failing OpenAI calls are an upstream problem.
pub fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Extraction(_) | PipelineError::NoText => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::Llm(_) | PipelineError::Index(IndexError::Embedding(_)) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn run(pipeline: &QaPipeline, filename: &str, form: &AskForm) -> Result<Answer, PipelineError> {
    info!("Question about '{}' ({} bytes): {}", filename, form.bytes.len(), form.question);
    let result = pipeline.run(&form.bytes, &form.question).await;
    match &result {
        Ok(answer) => info!("Answered with {} sources", answer.sources.len()),
        Err(e) => match status_for(e) {
            StatusCode::UNPROCESSABLE_ENTITY => warn!("Could not process '{}': {}", filename, e),
            _ => error!("Pipeline failed for '{}': {}", filename, e),
        },
    }
    result
}

/// `POST /ask`: multipart form in, HTML page out.
pub async fn ask_page(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let Some(pipeline) = state.pipeline.as_ref() else {
        return pages::index_page(&state.pages, true, None).into_response();
    };

    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err((status, msg)) => return pages::error_page(&state.pages, status, &msg).into_response(),
    };
    let filename = match check_upload(&form) {
        Ok(name) => name,
        Err((status, msg)) => return pages::error_page(&state.pages, status, &msg).into_response(),
    };
    if form.question.is_empty() {
        return pages::index_page(&state.pages, false, Some(pages::EMPTY_QUESTION_NOTICE)).into_response();
    }

    match run(pipeline, filename, &form).await {
        Ok(answer) => pages::answer_page(&state.pages, &form.question, &answer).into_response(),
        Err(e) => pages::error_page(&state.pages, status_for(&e), &e.to_string()).into_response(),
    }
}

#[derive(Serialize)]
pub struct SourceResponse {
    pub rank: usize,
    pub page_number: usize,
    pub score: f32,
    pub snippet: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceResponse>,
}

impl From<Answer> for AskResponse {
    fn from(answer: Answer) -> Self {
        let sources = answer
            .sources
            .into_iter()
            .map(|s| SourceResponse {
                rank: s.rank,
                page_number: s.page_number,
                score: s.score,
                snippet: s.snippet(),
                content: s.content,
            })
            .collect();
        Self {
            answer: answer.text,
            sources,
        }
    }
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// `POST /api/ask`: same form, JSON out.
pub async fn ask_json(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let Some(pipeline) = state.pipeline.as_ref() else {
        return json_error(StatusCode::SERVICE_UNAVAILABLE, MISSING_KEY_MESSAGE);
    };

    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err((status, msg)) => return json_error(status, msg),
    };
    let filename = match check_upload(&form) {
        Ok(name) => name,
        Err((status, msg)) => return json_error(status, msg),
    };
    if form.question.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "question must not be empty");
    }

    match run(pipeline, filename, &form).await {
        Ok(answer) => Json(AskResponse::from(answer)).into_response(),
        Err(e) => json_error(status_for(&e), e.to_string()),
    }
}
