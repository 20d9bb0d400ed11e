//! Natural-language question to tagged query translation.
//!
//! One model call per question, no retries. The model's reply is stripped
//! of Markdown code fences and parsed as JSON; anything that does not parse
//! becomes a [`TranslatedQuery::Error`] rather than a failure, so the caller
//! always gets something it can show the user.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::AiError;
use crate::prompt::build_system_prompt;
use crate::providers::{CompletionRequest, LlmProvider};

/// Explanation used when the model's reply is not valid JSON.
pub const PARSE_FAILURE_EXPLANATION: &str =
    "Failed to parse the generated query. Please try rephrasing your question.";

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 1000;

static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("valid regex"));
static OPENING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(?:json|JSON)?\s*").expect("valid regex"));
static CLOSING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("valid regex"));

/// A query produced by the model.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslatedQuery {
    /// A plain filter document.
    Find {
        /// Filter document.
        filter: Map<String, Value>,
        /// What the query does.
        explanation: String,
    },
    /// An aggregation pipeline.
    Aggregate {
        /// Pipeline stages, in order.
        pipeline: Vec<Value>,
        /// What the query does.
        explanation: String,
    },
    /// The model declined to produce a query.
    Error {
        /// Why no query was produced.
        explanation: String,
    },
    /// The model produced something that is neither a find nor an aggregate.
    Invalid {
        /// The `queryType` the model sent.
        query_type: String,
        /// What is wrong with it.
        reason: String,
        /// The model's explanation, if any.
        explanation: String,
    },
}

impl TranslatedQuery {
    /// The `queryType` tag of this query.
    #[must_use]
    pub fn query_type(&self) -> &str {
        match self {
            Self::Find { .. } => "find",
            Self::Aggregate { .. } => "aggregate",
            Self::Error { .. } => "error",
            Self::Invalid { query_type, .. } => query_type,
        }
    }

    /// The model's explanation.
    #[must_use]
    pub fn explanation(&self) -> &str {
        match self {
            Self::Find { explanation, .. }
            | Self::Aggregate { explanation, .. }
            | Self::Error { explanation }
            | Self::Invalid { explanation, .. } => explanation,
        }
    }
}

#[derive(Deserialize)]
struct RawTranslation {
    #[serde(rename = "queryType")]
    query_type: String,
    #[serde(default)]
    query: Value,
    #[serde(default)]
    explanation: Option<String>,
}

/// Removes Markdown code fences around the model's JSON.
///
/// A complete fenced block anywhere in the reply wins. Otherwise a leading
/// or trailing fence is stripped on its own, so a reply cut off before its
/// closing fence still parses.
#[must_use]
pub fn strip_code_fences(content: &str) -> &str {
    if let Some(block) = CODE_FENCE_RE.captures(content).and_then(|c| c.get(1)) {
        return block.as_str();
    }

    let mut json = content.trim();
    if let Some(m) = OPENING_FENCE_RE.find(json) {
        json = &json[m.end()..];
    }
    if let Some(m) = CLOSING_FENCE_RE.find(json) {
        json = &json[..m.start()];
    }
    json.trim()
}

/// Parses the model's reply into a [`TranslatedQuery`].
///
/// Never fails: unparseable replies become [`TranslatedQuery::Error`] with
/// [`PARSE_FAILURE_EXPLANATION`].
#[must_use]
pub fn parse_model_output(content: &str) -> TranslatedQuery {
    let json = strip_code_fences(content);

    let raw: RawTranslation = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Failed to parse model reply as a query: {e}");
            log::warn!("Reply: {content}");
            return TranslatedQuery::Error {
                explanation: PARSE_FAILURE_EXPLANATION.to_string(),
            };
        }
    };

    let RawTranslation {
        query_type,
        query,
        explanation,
    } = raw;
    let explanation = explanation.unwrap_or_default();

    match (query_type.as_str(), query) {
        ("error", _) => TranslatedQuery::Error { explanation },
        ("find", Value::Object(filter)) => TranslatedQuery::Find {
            filter,
            explanation,
        },
        ("find", Value::Null) => TranslatedQuery::Find {
            filter: Map::new(),
            explanation,
        },
        ("aggregate", Value::Array(pipeline)) => TranslatedQuery::Aggregate {
            pipeline,
            explanation,
        },
        ("find", _) => TranslatedQuery::Invalid {
            query_type: query_type.clone(),
            reason: "Find query must be a filter object".to_string(),
            explanation,
        },
        ("aggregate", _) => TranslatedQuery::Invalid {
            query_type: query_type.clone(),
            reason: "Aggregate query must be an array of pipeline stages".to_string(),
            explanation,
        },
        _ => TranslatedQuery::Invalid {
            query_type: query_type.clone(),
            reason: "Invalid query type".to_string(),
            explanation,
        },
    }
}

/// Translates questions about feed runs into queries.
#[derive(Clone)]
pub struct Translator {
    provider: Arc<dyn LlmProvider>,
    collection: String,
}

impl Translator {
    /// Creates a translator targeting the given collection.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, collection: impl Into<String>) -> Self {
        Self {
            provider,
            collection: collection.into(),
        }
    }

    /// Asks the model to translate `question`.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the provider call itself fails. A reply that
    /// cannot be parsed is not an error; see [`parse_model_output`].
    pub async fn translate(&self, question: &str) -> Result<TranslatedQuery, AiError> {
        let system_prompt =
            build_system_prompt(&self.collection, chrono::Utc::now().date_naive());

        let request = CompletionRequest {
            system_prompt: &system_prompt,
            prompt: question,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        log::info!("Translating question via {}", self.provider.name());
        let content = self.provider.complete(&request).await?;
        log::debug!("Model reply: {content}");

        Ok(parse_model_output(&content))
    }
}
