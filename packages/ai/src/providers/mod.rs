//! LLM provider abstraction and implementations.
//!
//! Supports Google Gemini, Anthropic Claude, and `OpenAI` via a common trait.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use crate::AiError;

/// A single-turn completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Instructions sent as the system prompt.
    pub system_prompt: &'a str,
    /// The user's message.
    pub prompt: &'a str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Sends a completion request and returns the model's text reply.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails or the reply has no text.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, AiError>;
}

/// Creates an LLM provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `GEMINI_API_KEY` set -> Google Gemini
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
/// 3. `OPENAI_API_KEY` set -> `OpenAI`
///
/// `AI_MODEL` overrides the provider's default model, and `AI_BASE_URL`
/// points the provider at a compatible self-hosted endpoint.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());
    let model = std::env::var("AI_MODEL").ok();
    let base_url = std::env::var("AI_BASE_URL").ok();

    match provider.to_lowercase().as_str() {
        "gemini" | "google" => {
            let api_key = required_key("GEMINI_API_KEY")?;
            let mut p = gemini::GeminiProvider::new(
                api_key,
                model.unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
            );
            if let Some(url) = base_url {
                p = p.with_base_url(url);
            }
            Ok(Box::new(p))
        }
        "anthropic" | "claude" => {
            let api_key = required_key("ANTHROPIC_API_KEY")?;
            let mut p = anthropic::AnthropicProvider::new(
                api_key,
                model.unwrap_or_else(|| anthropic::DEFAULT_MODEL.to_string()),
            );
            if let Some(url) = base_url {
                p = p.with_base_url(url);
            }
            Ok(Box::new(p))
        }
        "openai" | "gpt" => {
            let api_key = required_key("OPENAI_API_KEY")?;
            let mut p = openai::OpenAiProvider::new(
                api_key,
                model.unwrap_or_else(|| openai::DEFAULT_MODEL.to_string()),
            );
            if let Some(url) = base_url {
                p = p.with_base_url(url);
            }
            Ok(Box::new(p))
        }
        other => Err(AiError::Config {
            message: format!(
                "Unknown AI provider: {other}. Use 'gemini', 'anthropic', or 'openai'."
            ),
        }),
    }
}

fn required_key(var: &str) -> Result<String, AiError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AiError::Config {
            message: format!("{var} environment variable not set"),
        })
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_provider_from_env`].
fn detect_provider() -> String {
    if std::env::var("GEMINI_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Gemini (GEMINI_API_KEY found)");
        return "gemini".to_string();
    }

    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic".to_string();
    }

    if std::env::var("OPENAI_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: OpenAI (OPENAI_API_KEY found)");
        return "openai".to_string();
    }

    log::warn!(
        "No AI credentials detected. Set one of: GEMINI_API_KEY, \
         ANTHROPIC_API_KEY, or OPENAI_API_KEY. You can also set AI_PROVIDER explicitly."
    );

    // Fall back to gemini; produces a clear error about the missing key
    "gemini".to_string()
}
