//! LLM interaction: the explanation and specification calls.
//!
//! Both calls share one retry loop. All prompt wording lives in
//! [`crate::prompts`]; this module only assembles messages, applies the
//! per-call timeout and backs off between attempts.
//!
//! ## Retry Strategy
//!
//! Backoff is `retry_backoff_ms * 2^(attempt-1)`: with 500 ms base and three
//! retries the waits are 500 ms → 1 s → 2 s. A generation run makes only
//! two calls, so there is no concurrency to spread out; the backoff exists
//! for 429/503 responses from a busy endpoint.

use crate::config::GenerationConfig;
use crate::error::TechSpecError;
use crate::progress::Stage;
use crate::prompts::{
    combined_context, specification_request, EXPLANATION_SYSTEM_PROMPT,
    SPECIFICATION_SYSTEM_PROMPT,
};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Content and token usage of one successful call.
#[derive(Debug, Clone)]
pub struct LlmReply {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Step 1: ask for a technical and functional explanation of the source.
pub async fn explain_source(
    provider: &Arc<dyn LLMProvider>,
    source: &str,
    config: &GenerationConfig,
) -> Result<LlmReply, TechSpecError> {
    let system = config
        .explanation_prompt
        .as_deref()
        .unwrap_or(EXPLANATION_SYSTEM_PROMPT);
    let messages = vec![ChatMessage::system(system), ChatMessage::user(source)];

    call_with_retry(
        provider,
        Stage::Explain,
        &messages,
        config.explanation_temperature,
        config,
    )
    .await
}

/// Step 2: write the specification from explanation, passages and source.
pub async fn draft_specification(
    provider: &Arc<dyn LLMProvider>,
    source: &str,
    explanation: &str,
    passages: &[String],
    config: &GenerationConfig,
) -> Result<LlmReply, TechSpecError> {
    let system = config
        .specification_prompt
        .as_deref()
        .unwrap_or(SPECIFICATION_SYSTEM_PROMPT);
    let context = combined_context(explanation, passages);
    let messages = vec![
        ChatMessage::system(system),
        ChatMessage::user(specification_request(&context, source, config.min_words)),
    ];

    call_with_retry(
        provider,
        Stage::Draft,
        &messages,
        config.specification_temperature,
        config,
    )
    .await
}

async fn call_with_retry(
    provider: &Arc<dyn LLMProvider>,
    stage: Stage,
    messages: &[ChatMessage],
    temperature: f32,
    config: &GenerationConfig,
) -> Result<LlmReply, TechSpecError> {
    let start = Instant::now();
    let options = build_options(temperature, config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_err: Option<String> = None;
    let mut last_was_timeout = false;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            let reason = last_err.as_deref().unwrap_or("unknown error");
            warn!(
                "{}: retry {}/{} after {}ms",
                stage, attempt, config.max_retries, backoff
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_retry(stage, attempt, backoff, reason);
            }
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(call_timeout, provider.chat(messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    stage,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return Ok(LlmReply {
                    content: response.content,
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                });
            }
            Ok(Err(e)) => {
                let err_msg = format!("{}", e);
                warn!("{}: attempt {} failed — {}", stage, attempt + 1, err_msg);
                last_err = Some(err_msg);
                last_was_timeout = false;
            }
            Err(_) => {
                warn!(
                    "{}: attempt {} timed out after {}s",
                    stage,
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_err = Some(format!("timed out after {}s", config.api_timeout_secs));
                last_was_timeout = true;
            }
        }
    }

    if last_was_timeout {
        return Err(TechSpecError::ApiTimeout {
            stage: stage.to_string(),
            secs: config.api_timeout_secs,
        });
    }

    Err(TechSpecError::LlmApiError {
        stage: stage.to_string(),
        retries: config.max_retries,
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

/// Build `CompletionOptions` for one call.
fn build_options(temperature: f32, config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_uses_stage_temperature() {
        let config = GenerationConfig::default();
        let opts = build_options(config.specification_temperature, &config);
        assert_eq!(opts.temperature, Some(0.4));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 3), 2000);
    }

    #[test]
    fn backoff_saturates() {
        assert_eq!(backoff_ms(u64::MAX, 5), u64::MAX);
    }
}
