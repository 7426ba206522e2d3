use minijinja::Environment;
use pdfqa_core::{Config, ConfigError};
use tracing::{info, warn};

use crate::api::pages;
use crate::pipeline::{PipelineError, QaPipeline};

pub struct AppState {
    pub config: Config,
    /// `None` when no API key is configured; every question is then refused.
    pub pipeline: Option<QaPipeline>,
    pub pages: Environment<'static>,
}

impl AppState {
    /// Build state from config. A missing API key is not fatal (the UI shows a
    /// warning), any other invalid setting is.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let pipeline = match QaPipeline::from_config(&config) {
            Ok(pipeline) => {
                let opts = pipeline.options();
                info!(
                    "Question answering ready (top_k={}, metric={}, upload={})",
                    opts.top_k,
                    opts.metric,
                    opts.upload_path.display()
                );
                Some(pipeline)
            }
            Err(PipelineError::Config(ConfigError::MissingSecret(key))) => {
                warn!("{} is not set; questions will be refused until it is", key);
                None
            }
            Err(e) => return Err(e.into()),
        };
        Self::with_pipeline(config, pipeline)
    }

    pub fn with_pipeline(config: Config, pipeline: Option<QaPipeline>) -> anyhow::Result<Self> {
        Ok(Self {
            pipeline,
            pages: pages::environment(&config.openai.chat_model)?,
            config,
        })
    }
}
