//! Command line interface.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use pdfqa_core::{Config, ConfigError};
use pdfqa_ingest::ensure_pdf_filename;

use crate::pipeline::{Answer, PipelineError, QaPipeline};

/// Ask questions about a PDF using retrieval-augmented generation.
#[derive(Parser, Debug)]
#[command(name = "pdfqa", version, about)]
pub struct CliArgs {
    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first
    #[arg(long, env = "PDFQA_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server (default)
    Serve {
        /// Port override
        #[arg(long)]
        port: Option<u16>,
    },
    /// Answer a single question about a PDF and exit
    Ask {
        /// PDF to read
        #[arg(long)]
        file: PathBuf,

        /// Question to answer
        #[arg(long)]
        question: String,
    },
}

/// Run the pipeline once and print the answer with its sources.
pub async fn ask(config: &Config, file: &Path, question: &str) -> anyhow::Result<()> {
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    ensure_pdf_filename(&filename).with_context(|| format!("{} is not a PDF", file.display()))?;

    let question = question.trim();
    anyhow::ensure!(!question.is_empty(), "question must not be empty");

    let pipeline = match QaPipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(PipelineError::Config(ConfigError::MissingSecret(_))) => {
            anyhow::bail!("Please set your OpenAI API key in a .env file or the environment.")
        }
        Err(e) => return Err(e.into()),
    };
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let answer = pipeline.run(&bytes, question).await?;
    print!("{}", format_answer(&answer));
    Ok(())
}

pub fn format_answer(answer: &Answer) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Answer\n\n{}\n", answer.text.trim());
    let _ = writeln!(out, "Source Chunks Used:");
    for source in &answer.sources {
        let _ = writeln!(out, "\nSource #{} — Page {}", source.rank, source.page_number);
        let _ = writeln!(out, "  {}", source.snippet());
    }
    out
}
