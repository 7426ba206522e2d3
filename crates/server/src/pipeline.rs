//! One question against one uploaded PDF: persist, load, split, embed,
//! retrieve, prompt. Nothing survives the request.

use std::path::PathBuf;

use pdfqa_core::{Config, ConfigError};
use pdfqa_ingest::{
    load_pdf, persist_upload, DistanceMetric, Embedder, ExtractionError, IndexError, OpenAiEmbedder,
    PageContent, RecursiveCharacterSplitter, ScoredChunk, SplitterError, VectorIndex,
};
use pdfqa_llm::{create_provider, ChainError, LlmError, PromptError, PromptTemplate, RagChain};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

const SNIPPET_CHARS: usize = 300;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("the document contains no extractable text")]
    NoText,
    #[error(transparent)]
    Splitter(#[from] SplitterError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<ChainError> for PipelineError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::Prompt(e) => PipelineError::Prompt(e),
            ChainError::Llm(e) => PipelineError::Llm(e),
        }
    }
}

/// A retrieved chunk as shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    /// 1-based position in the retrieval order.
    pub rank: usize,
    pub page_number: usize,
    pub content: String,
    pub score: f32,
}

impl Source {
    /// First 300 characters with newlines flattened, followed by `...`.
    pub fn snippet(&self) -> String {
        let head: String = self.content.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", head.replace('\n', " "))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Source>,
}

impl Answer {
    fn from_hits(text: String, hits: Vec<ScoredChunk>) -> Self {
        let sources = hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| Source {
                rank: i + 1,
                page_number: hit.chunk.page_number,
                content: hit.chunk.content,
                score: hit.score,
            })
            .collect();
        Self { text, sources }
    }
}

/// Retrieval knobs that do not involve a backend.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub upload_path: PathBuf,
    pub metric: DistanceMetric,
    pub top_k: usize,
    pub batch_size: usize,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            upload_path: config.server.upload_path.clone(),
            metric: config.retrieval.metric.parse()?,
            top_k: config.retrieval.top_k,
            batch_size: config.openai.embedding_batch_size,
        })
    }
}

pub struct QaPipeline {
    embedder: Box<dyn Embedder>,
    splitter: RecursiveCharacterSplitter,
    chain: RagChain,
    options: PipelineOptions,
}

impl QaPipeline {
    pub fn new(
        embedder: Box<dyn Embedder>,
        splitter: RecursiveCharacterSplitter,
        chain: RagChain,
        options: PipelineOptions,
    ) -> Self {
        Self {
            embedder,
            splitter,
            chain,
            options,
        }
    }

    /// Build the OpenAI-backed pipeline. Fails before constructing anything
    /// when the API key is missing.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        config.openai.require_api_key()?;

        let options = PipelineOptions::from_config(config)?;
        let splitter = RecursiveCharacterSplitter::from_config(&config.splitter)?;
        let template =
            PromptTemplate::from_optional_path(config.retrieval.prompt_template_path.as_deref())?;
        let embedder = OpenAiEmbedder::from_config(&config.openai)?;
        let provider = create_provider(&config.openai)?;
        let chain = RagChain::new(
            provider,
            template,
            config.openai.temperature,
            config.openai.max_tokens,
        );

        Ok(Self::new(Box::new(embedder), splitter, chain, options))
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Persist the upload, parse it, and answer `question` from it.
    ///
    /// The upload is written to a single fixed path, so concurrent runs
    /// overwrite each other's file.
    pub async fn run(&self, upload: &[u8], question: &str) -> Result<Answer, PipelineError> {
        persist_upload(&self.options.upload_path, upload).await?;

        let path = self.options.upload_path.clone();
        let doc = tokio::task::spawn_blocking(move || load_pdf(&path))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))??;

        self.answer_pages(&doc.pages, question).await
    }

    /// Split, index, retrieve, and ask, on already-parsed pages.
    pub async fn answer_pages(
        &self,
        pages: &[PageContent],
        question: &str,
    ) -> Result<Answer, PipelineError> {
        let chunks = self.splitter.split_documents(pages);
        if chunks.is_empty() {
            return Err(PipelineError::NoText);
        }
        info!("Split {} pages into {} chunks", pages.len(), chunks.len());

        let index = VectorIndex::build(
            self.embedder.as_ref(),
            chunks,
            self.options.metric,
            self.options.batch_size,
        )
        .await?;

        // Retrieve once: the same chunks feed the prompt and the displayed sources.
        let hits = index
            .retrieve(self.embedder.as_ref(), question, self.options.top_k)
            .await?;
        let contexts: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
        let text = self.chain.answer(&contexts, question).await?;

        Ok(Answer::from_hits(text, hits))
    }
}
