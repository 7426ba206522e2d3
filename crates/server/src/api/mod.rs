pub mod ask;
pub mod health;
pub mod pages;

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;

use crate::state::AppState;

pub use ask::{ask_json, ask_page};
pub use health::{config, health};

/// `GET /`: the upload form, or only a warning when no API key is configured.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    pages::index_page(&state.pages, state.pipeline.is_none(), None)
}
