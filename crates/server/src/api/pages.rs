//! Server-rendered HTML pages.

use axum::http::StatusCode;
use axum::response::Html;
use minijinja::{context, Environment};
use serde::Serialize;
use tracing::error;

use crate::pipeline::Answer;

/// Shown when a question is submitted empty.
pub const EMPTY_QUESTION_NOTICE: &str = "Type a question about the PDF to get an answer.";

/// Template environment with every page registered. `.html` names get HTML
/// auto-escaping. `model` is the chat model named in page titles and headings.
pub fn environment(model: &str) -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_global("model", model.to_string());
    env.add_template("base.html", include_str!("../../templates/base.html"))?;
    env.add_template("index.html", include_str!("../../templates/index.html"))?;
    env.add_template("answer.html", include_str!("../../templates/answer.html"))?;
    env.add_template("error.html", include_str!("../../templates/error.html"))?;
    Ok(env)
}

fn render<S: Serialize>(env: &Environment<'_>, name: &str, ctx: S) -> Html<String> {
    match env.get_template(name).and_then(|t| t.render(ctx)) {
        Ok(html) => Html(html),
        Err(e) => {
            error!("Failed to render {}: {:#}", name, e);
            Html("<h1>Internal error</h1>".to_string())
        }
    }
}

pub fn index_page(env: &Environment<'_>, missing_key: bool, notice: Option<&str>) -> Html<String> {
    render(env, "index.html", context! { missing_key, notice })
}

#[derive(Serialize)]
struct SourceView {
    rank: usize,
    page_number: usize,
    snippet: String,
}

pub fn answer_page(env: &Environment<'_>, question: &str, answer: &Answer) -> Html<String> {
    let sources: Vec<SourceView> = answer
        .sources
        .iter()
        .map(|s| SourceView {
            rank: s.rank,
            page_number: s.page_number,
            snippet: s.snippet(),
        })
        .collect();
    render(
        env,
        "answer.html",
        context! { question, answer => answer.text, sources },
    )
}

pub fn error_page(env: &Environment<'_>, status: StatusCode, message: &str) -> (StatusCode, Html<String>) {
    let title = status.canonical_reason().unwrap_or("Error");
    (status, render(env, "error.html", context! { title, message }))
}
