//! Configuration types for specification generation.
//!
//! Only the LLM glue is configurable. The markup compiler and its style
//! table are fixed, so nothing here influences how a given markup string
//! renders.
//!
//! Built via [`GenerationConfig::builder()`]; setters clamp out-of-range
//! values and [`GenerationConfigBuilder::build`] validates the rest.

use crate::error::TechSpecError;
use crate::pipeline::retrieve::ContextRetriever;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Model used when neither the caller nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for an ABAP → specification run.
///
/// # Example
/// ```rust
/// use abap_techspec::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gpt-4o")
///     .min_words(1500)
///     .max_retries(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.min_words, 1500);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM model identifier. If None, [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Knowledge-base retriever. Without one every run yields the
    /// "no relevant context" sentinel.
    pub retriever: Option<Arc<dyn ContextRetriever>>,

    /// Temperature for the explanation call. Default: 0.3.
    pub explanation_temperature: f32,

    /// Temperature for the specification call. Default: 0.4.
    pub specification_temperature: f32,

    /// Maximum tokens per LLM response. Default: 8192.
    ///
    /// A 2 000-word specification with tables and code runs to roughly
    /// 4 000 tokens; the headroom keeps long reports from being cut off.
    pub max_tokens: usize,

    /// Minimum document length requested in the prompt. Default: 2000.
    pub min_words: usize,

    /// Retries per LLM call on failure. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. Default: 180.
    pub api_timeout_secs: u64,

    /// Override for the explanation system prompt.
    pub explanation_prompt: Option<String>,

    /// Override for the specification system prompt.
    pub specification_prompt: Option<String>,

    /// Stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            retriever: None,
            explanation_temperature: 0.3,
            specification_temperature: 0.4,
            max_tokens: 8192,
            min_words: 2000,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 180,
            explanation_prompt: None,
            specification_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "retriever",
                &self.retriever.as_ref().map(|_| "<dyn ContextRetriever>"),
            )
            .field("explanation_temperature", &self.explanation_temperature)
            .field("specification_temperature", &self.specification_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("min_words", &self.min_words)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn retriever(mut self, retriever: Arc<dyn ContextRetriever>) -> Self {
        self.config.retriever = Some(retriever);
        self
    }

    pub fn explanation_temperature(mut self, t: f32) -> Self {
        self.config.explanation_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn specification_temperature(mut self, t: f32) -> Self {
        self.config.specification_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn min_words(mut self, n: usize) -> Self {
        self.config.min_words = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn explanation_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.explanation_prompt = Some(prompt.into());
        self
    }

    pub fn specification_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.specification_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, TechSpecError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(TechSpecError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(TechSpecError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if c.max_retries > 10 {
            return Err(TechSpecError::InvalidConfig(format!(
                "max_retries must be 0–10, got {}",
                c.max_retries
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::retrieve::StaticRetriever;

    #[test]
    fn defaults() {
        let c = GenerationConfig::default();
        assert_eq!(c.explanation_temperature, 0.3);
        assert_eq!(c.specification_temperature, 0.4);
        assert_eq!(c.min_words, 2000);
        assert_eq!(c.model_or_default(), "gpt-4o");
        assert!(c.retriever.is_none());
    }

    #[test]
    fn temperatures_are_clamped() {
        let c = GenerationConfig::builder()
            .explanation_temperature(-1.0)
            .specification_temperature(9.0)
            .build()
            .unwrap();
        assert_eq!(c.explanation_temperature, 0.0);
        assert_eq!(c.specification_temperature, 2.0);
    }

    #[test]
    fn zero_max_tokens_rejected() {
        let err = GenerationConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, TechSpecError::InvalidConfig(_)));
    }

    #[test]
    fn too_many_retries_rejected() {
        assert!(GenerationConfig::builder().max_retries(11).build().is_err());
        assert!(GenerationConfig::builder().max_retries(10).build().is_ok());
    }

    #[test]
    fn debug_hides_trait_objects() {
        let c = GenerationConfig::builder()
            .retriever(Arc::new(StaticRetriever::from_text("kb")))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn ContextRetriever>"));
        assert!(dbg.contains("provider: None"));
    }
}
