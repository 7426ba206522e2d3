pub mod chain;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use chain::{ChainError, RagChain};
pub use prompt::{PromptError, PromptTemplate, DEFAULT_TEMPLATE};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
