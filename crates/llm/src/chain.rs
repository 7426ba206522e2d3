use tracing::info;

use crate::prompt::{PromptError, PromptTemplate};
use crate::provider::{LlmError, LlmProvider, Message};

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Retrieved context + question → prompt → model answer.
pub struct RagChain {
    provider: Box<dyn LlmProvider>,
    template: PromptTemplate,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl RagChain {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        template: PromptTemplate,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Self {
        Self {
            provider,
            template,
            temperature,
            max_tokens,
        }
    }

    /// Render the prompt for `contexts` without calling the model.
    pub fn prompt_for<S: AsRef<str>>(&self, contexts: &[S], question: &str) -> Result<String, PromptError> {
        let context = contexts
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join("\n\n");
        self.template.render(&context, question)
    }

    /// Answer `question` from the given context passages.
    pub async fn answer<S: AsRef<str>>(&self, contexts: &[S], question: &str) -> Result<String, ChainError> {
        let prompt = self.prompt_for(contexts, question)?;
        info!(
            "Asking model with {} context passages ({} prompt chars)",
            contexts.len(),
            prompt.chars().count()
        );
        let answer = self
            .provider
            .complete(vec![Message::user(prompt)], self.temperature, self.max_tokens)
            .await?;
        Ok(answer)
    }
}
