use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Resolves config keys against a variable source, honoring an optional profile prefix.
///
/// With profile `PROD`, `PORT` is looked up as `PROD_PORT` first, then `PORT`.
struct EnvReader<'a> {
    profile: &'a str,
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl EnvReader<'_> {
    fn opt(&self, key: &str) -> Option<String> {
        let get = |k: &str| (self.lookup)(k).filter(|s| !s.is_empty());
        if !self.profile.is_empty() {
            if let Some(v) = get(&format!("{}_{}", self.profile, key)) {
                return Some(v);
            }
        }
        get(key)
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.opt(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
    pub splitter: SplitterConfig,
    pub retrieval: RetrievalConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PDFQA_PROFILE`. When set (e.g. `PROD`), every key is
    /// first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env::var("PDFQA_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        Self::from_lookup(profile, |key| env::var(key).ok())
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup(profile: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let p = profile.to_uppercase();
        let reader = EnvReader {
            profile: &p,
            lookup: &lookup,
        };
        Self {
            profile: p.clone(),
            server: ServerConfig::read(&reader),
            openai: OpenAiConfig::read(&reader),
            splitter: SplitterConfig::read(&reader),
            retrieval: RetrievalConfig::read(&reader),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:     {}:{}, upload_path={}", self.server.host, self.server.port, self.server.upload_path.display());
        tracing::info!(
            "  openai:     chat={}, embedding={} ({} dims), key={}",
            self.openai.chat_model,
            self.openai.embedding_model,
            self.openai.embedding_dimensions,
            if self.openai.is_configured() { "set" } else { "MISSING" }
        );
        tracing::info!("  splitter:   chunk_size={}, overlap={}", self.splitter.chunk_size, self.splitter.chunk_overlap);
        tracing::info!("  retrieval:  top_k={}, metric={}", self.retrieval.top_k, self.retrieval.metric);
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": {
                "host": self.server.host,
                "port": self.server.port,
                "max_upload_mb": self.server.max_upload_mb,
            },
            "openai": {
                "base_url": self.openai.base_url,
                "chat_model": self.openai.chat_model,
                "embedding_model": self.openai.embedding_model,
                "embedding_dimensions": self.openai.embedding_dimensions,
                "temperature": self.openai.temperature,
                "configured": self.openai.is_configured(),
            },
            "splitter": {
                "chunk_size": self.splitter.chunk_size,
                "chunk_overlap": self.splitter.chunk_overlap,
            },
            "retrieval": {
                "top_k": self.retrieval.top_k,
                "metric": self.retrieval.metric,
                "custom_prompt": self.retrieval.prompt_template_path.is_some(),
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Fixed path every upload is written to before parsing.
    pub upload_path: PathBuf,
    pub max_upload_mb: usize,
}

impl ServerConfig {
    fn read(env: &EnvReader) -> Self {
        Self {
            host: env.or("HOST", "0.0.0.0"),
            port: env.parsed("PORT", 8501),
            cors_origin: env.or("CORS_ORIGIN", "*"),
            upload_path: PathBuf::from(env.or("UPLOAD_PATH", "temp.pdf")),
            max_upload_mb: env.parsed("MAX_UPLOAD_MB", 200),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

// ── OpenAI (embeddings + chat completions) ────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub embedding_batch_size: usize,
    pub temperature: f32,
    /// `None` leaves the completion length to the provider.
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    fn read(env: &EnvReader) -> Self {
        Self {
            api_key: env.opt("OPENAI_API_KEY"),
            base_url: env.or("OPENAI_BASE_URL", "https://api.openai.com"),
            chat_model: env.or("OPENAI_CHAT_MODEL", "gpt-4"),
            embedding_model: env.or("OPENAI_EMBEDDING_MODEL", "text-embedding-3-large"),
            embedding_dimensions: env.parsed("EMBEDDING_DIMENSIONS", 3072),
            embedding_batch_size: env.parsed("EMBEDDING_BATCH_SIZE", 64),
            temperature: env.parsed("LLM_TEMPERATURE", 0.7),
            max_tokens: env.opt("LLM_MAX_TOKENS").and_then(|v| v.trim().parse().ok()),
            timeout_secs: env.parsed("OPENAI_TIMEOUT_SECS", 120),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// The API key, or `MissingSecret` when it is absent.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingSecret("OPENAI_API_KEY"))
    }
}

// ── Splitter ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next.
    pub chunk_overlap: usize,
}

impl SplitterConfig {
    fn read(env: &EnvReader) -> Self {
        Self {
            chunk_size: env.parsed("CHUNK_SIZE", 1000),
            chunk_overlap: env.parsed("CHUNK_OVERLAP", 200),
        }
    }
}

// ── Retrieval ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// "l2" or "cosine"
    pub metric: String,
    pub prompt_template_path: Option<PathBuf>,
}

impl RetrievalConfig {
    fn read(env: &EnvReader) -> Self {
        Self {
            top_k: env.parsed("RETRIEVAL_TOP_K", 3),
            metric: env.or("RETRIEVAL_METRIC", "l2").to_lowercase(),
            prompt_template_path: env.opt("PROMPT_TEMPLATE_PATH").map(PathBuf::from),
        }
    }
}
