use crate::{
    client::{self, ChatBackend, CompletionRequest, Summary},
    config::Config,
    credentials::{self, ApiKey},
    error::{ConfigurationError, Error, ExtractionError},
    extract::Extractor,
    model::Model,
    postprocess::TextCleaner,
    prompt,
};
use std::path::Path;
use tracing::info;

/// Model choice plus credential, exposing the summarize operations.
///
/// Everything is fixed at construction; each summarize call is independent
/// and makes exactly one vendor request.
pub struct Reader {
    model: Model,
    max_tokens: u32,
    instruction: String,
    backend: Box<dyn ChatBackend>,
    extractor: Extractor,
    cleaner: TextCleaner,
}

impl Reader {
    /// Default configuration, key from `api_key` or the vendor's env var.
    pub fn new(model: &str, api_key: Option<&str>) -> Result<Self, ConfigurationError> {
        Self::from_config(&Config::default(), model, api_key)
    }

    pub fn from_config(
        cfg: &Config,
        model: &str,
        api_key: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        Self::with_env(cfg, model, api_key, credentials::process_env)
    }

    /// Like [`Reader::from_config`] with an explicit environment lookup.
    pub fn with_env<F>(
        cfg: &Config,
        model: &str,
        api_key: Option<&str>,
        lookup: F,
    ) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = Model::parse(model)?;
        let key: ApiKey =
            credentials::resolve_api_key(model.vendor, cfg.provider(model.vendor), api_key, lookup)?;
        let backend = client::backend_for(model.vendor, cfg, key)?;
        let cleaner = TextCleaner::new(&cfg.postprocess)
            .map_err(|e| ConfigurationError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            model,
            max_tokens: cfg.model.max_tokens.max(1),
            instruction: cfg.model.instruction.clone(),
            backend,
            extractor: Extractor::new(cfg),
            cleaner,
        })
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Extract `path`, then summarize its text.
    pub fn summarize_file(&self, path: &Path, instruction: Option<&str>) -> Result<Summary, Error> {
        let doc = self.extractor.extract(path)?;
        info!(
            "extracted {} via {:?} pages={:?}",
            doc.path, doc.method, doc.page_count
        );
        self.summarize_text(&doc.text(), instruction)
    }

    /// Summarize already-extracted text.
    pub fn summarize_text(&self, text: &str, instruction: Option<&str>) -> Result<Summary, Error> {
        let cleaned = self.cleaner.clean(text);
        if cleaned.is_empty() {
            return Err(ExtractionError::NoText("<input text>".into()).into());
        }

        let instruction = instruction
            .and_then(prompt::sanitize_instruction)
            .unwrap_or_else(|| self.instruction.clone());
        let prompt = prompt::build_prompt(&cleaned, Some(&instruction));
        let req = CompletionRequest {
            model: &self.model.id,
            prompt: &prompt,
            max_tokens: self.max_tokens,
        };
        let summary = self.backend.complete(&req)?;
        info!(
            "summary from {} model={} chars={} usage={:?}",
            self.backend.vendor(),
            summary.model,
            summary.text.len(),
            summary.usage
        );
        Ok(summary)
    }
}
