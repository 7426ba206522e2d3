//! Prompt template rendered with minijinja.
//!
//! Templates take two variables, `context` (the retrieved chunks) and
//! `question`. Both must be referenced, otherwise the model either never sees
//! the document or never sees what was asked.

use std::path::Path;

use minijinja::{context, Environment};
use thiserror::Error;

/// The built-in question answering prompt.
pub const DEFAULT_TEMPLATE: &str = r#"You are a helpful assistant. Use the following context to answer the user's question.
If the answer is not in the context, say "I don't know".

Context:
{{ context }}

Question:
{{ question }}

Answer:
"#;

const REQUIRED_VARIABLES: [&str; 2] = ["context", "question"];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("template syntax error: {0}")]
    Syntax(String),
    #[error("template never uses '{0}'")]
    MissingVariable(&'static str),
    #[error("render failed: {0}")]
    Render(String),
    #[error("cannot read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    /// Validate and wrap a template string.
    pub fn new(source: impl Into<String>) -> Result<Self, PromptError> {
        let source = source.into();
        let used = {
            let env = Environment::new();
            let template = env
                .template_from_str(&source)
                .map_err(|e| PromptError::Syntax(e.to_string()))?;
            template.undeclared_variables(false)
        };
        for var in REQUIRED_VARIABLES {
            if !used.contains(var) {
                return Err(PromptError::MissingVariable(var));
            }
        }
        Ok(Self { source })
    }

    /// Load an override from disk.
    pub fn from_file(path: &Path) -> Result<Self, PromptError> {
        let source = std::fs::read_to_string(path).map_err(|e| PromptError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::info!("Loaded prompt template from {}", path.display());
        Self::new(source)
    }

    /// The configured override if there is one, the built-in template otherwise.
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self, PromptError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, context: &str, question: &str) -> Result<String, PromptError> {
        let env = Environment::new();
        env.render_str(&self.source, context! { context, question })
            .map_err(|e| PromptError::Render(e.to_string()))
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
        }
    }
}
