//! HTTP router construction.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::api;
use crate::state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!("Invalid CORS_ORIGIN '{}', allowing any origin", origin);
            CorsLayer::permissive()
        }
    }
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_upload_bytes();
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/", get(api::index))
        .route("/ask", post(api::ask_page))
        .route("/api/ask", post(api::ask_json))
        .route("/health", get(api::health))
        .route("/api/config", get(api::config))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use pdfqa_core::Config;
    use tower::ServiceExt;

    use crate::pipeline::testing::{pipeline, EchoProvider, TWO_PAGE_PDF};

    const BOUNDARY: &str = "pdfqa-test-boundary";

    fn config(upload: &Path, key: Option<&str>) -> Config {
        let upload = upload.display().to_string();
        let key = key.map(str::to_string);
        Config::from_lookup("", move |k| match k {
            "UPLOAD_PATH" => Some(upload.clone()),
            "OPENAI_API_KEY" => key.clone(),
            "MAX_UPLOAD_MB" => Some("1".into()),
            "OPENAI_CHAT_MODEL" => Some("gpt-4o-mini".into()),
            _ => None,
        })
    }

    fn app(upload: PathBuf, configured: bool) -> Router {
        let key = configured.then_some("sk-test");
        let qa = configured.then(|| pipeline(upload.clone(), EchoProvider::default()));
        let state = AppState::with_pipeline(config(&upload, key), qa).unwrap();
        build_router(Arc::new(state))
    }

    fn multipart(uri: &str, file: Option<(&str, &[u8])>, question: Option<&str>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some((name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(q) = question {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"question\"\r\n\r\n{q}\r\n").as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn health_reports_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path().join("temp.pdf"), false), get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["configured"], false);
    }

    #[tokio::test]
    async fn index_shows_warning_without_key() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path().join("temp.pdf"), false), get_req("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Please set your OpenAI API key"));
        assert!(!body.contains("<form"));
    }

    #[tokio::test]
    async fn index_shows_form_with_key() {
        let dir = tempfile::tempdir().unwrap();
        let (_, body) = send(app(dir.path().join("temp.pdf"), true), get_req("/")).await;
        assert!(body.contains(r#"accept=".pdf""#));
        assert!(body.contains("<title>PDF QA with gpt-4o-mini</title>"));
    }

    #[tokio::test]
    async fn missing_key_processes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("temp.pdf");
        let req = multipart("/ask", Some(("paper.pdf", b"%PDF-1.4 junk".as_slice())), Some("What?"));

        let (status, body) = send(app(upload.clone(), false), req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Please set your OpenAI API key"));
        assert!(!upload.exists());
    }

    #[tokio::test]
    async fn json_missing_key_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("temp.pdf");
        let req = multipart("/api/ask", Some(("paper.pdf", b"%PDF-1.4 junk".as_slice())), Some("What?"));

        let (status, body) = send(app(upload.clone(), false), req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("OpenAI API key"));
        assert!(!upload.exists());
    }

    #[tokio::test]
    async fn missing_file_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let req = multipart("/ask", None, Some("What?"));
        let (status, body) = send(app(dir.path().join("temp.pdf"), true), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Please upload a PDF file."));
    }

    #[tokio::test]
    async fn non_pdf_upload_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("temp.pdf");
        let req = multipart("/ask", Some(("notes.txt", b"plain text".as_slice())), Some("What?"));
        let (status, _) = send(app(upload.clone(), true), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!upload.exists());
    }

    #[tokio::test]
    async fn empty_question_re_renders_form() {
        let dir = tempfile::tempdir().unwrap();
        let upload = dir.path().join("temp.pdf");
        let req = multipart("/ask", Some(("paper.pdf", b"%PDF-1.4 junk".as_slice())), Some("   "));
        let (status, body) = send(app(upload.clone(), true), req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(crate::api::pages::EMPTY_QUESTION_NOTICE));
        assert!(body.contains("<form"));
        assert!(!upload.exists());
    }

    #[tokio::test]
    async fn unreadable_pdf_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let req = multipart("/ask", Some(("paper.pdf", b"not really a pdf".as_slice())), Some("What?"));
        let (status, body) = send(app(dir.path().join("temp.pdf"), true), req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.contains("PDF extraction failed"));
    }

    #[tokio::test]
    async fn json_unreadable_pdf_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let req = multipart("/api/ask", Some(("paper.pdf", b"not really a pdf".as_slice())), Some("What?"));
        let (status, body) = send(app(dir.path().join("temp.pdf"), true), req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("PDF extraction failed"));
    }

    #[tokio::test]
    async fn answer_page_cites_page_two() {
        let dir = tempfile::tempdir().unwrap();
        let req = multipart("/ask", Some(("animals.pdf", TWO_PAGE_PDF)), Some("What does the whale eat?"));
        let (status, body) = send(app(dir.path().join("temp.pdf"), true), req).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Source #1 — Page 2"));
        assert!(body.contains("krill"));
        assert!(body.contains("gpt-4o-mini's Answer"));
    }

    #[tokio::test]
    async fn json_answer_reports_page_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let req = multipart("/api/ask", Some(("animals.pdf", TWO_PAGE_PDF)), Some("What does the whale eat?"));
        let (status, body) = send(app(dir.path().join("temp.pdf"), true), req).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["sources"][0]["page_number"], 2);
        assert!(json["answer"].as_str().unwrap().contains("krill"));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let big = vec![b'x'; 2 * 1024 * 1024];
        let req = multipart("/api/ask", Some(("big.pdf", big.as_slice())), Some("What?"));
        let (status, _) = send(app(dir.path().join("temp.pdf"), true), req).await;
        assert!(status.is_client_error(), "got {status}");
    }

    #[tokio::test]
    async fn config_endpoint_hides_secret() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(app(dir.path().join("temp.pdf"), true), get_req("/api/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("sk-test"));
        assert!(body.contains("\"configured\":true"));
    }
}
