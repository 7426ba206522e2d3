pub mod openai;

use std::time::Duration;

use pdfqa_core::config::OpenAiConfig;

use crate::provider::{LlmError, LlmProvider};

/// Create the chat completion provider from config.
pub fn create_provider(config: &OpenAiConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    let api_key = config
        .api_key
        .as_ref()
        .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
    Ok(Box::new(openai::OpenAiProvider::new(
        api_key.clone(),
        config.chat_model.clone(),
        config.base_url.clone(),
        Duration::from_secs(config.timeout_secs),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfqa_core::Config;

    #[test]
    fn missing_key_is_not_configured() {
        let config = Config::from_lookup("", |_| None);
        let err = create_provider(&config.openai).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(_)));
    }

    #[test]
    fn key_present_builds_provider() {
        let config = Config::from_lookup("", |k| (k == "OPENAI_API_KEY").then(|| "sk-x".into()));
        assert!(create_provider(&config.openai).is_ok());
    }
}
