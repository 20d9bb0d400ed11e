#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Natural-language to query translation for the feed log.
//!
//! Supports Google Gemini, Anthropic Claude, and `OpenAI` behind a common
//! [`providers::LlmProvider`] trait. The [`translator`] sends a fixed system
//! prompt describing the feed run collection together with the user's
//! question, and turns the model's reply into a tagged
//! [`translator::TranslatedQuery`]: a find filter, an aggregation pipeline,
//! or an explanation of why no query could be produced.

pub mod prompt;
pub mod providers;
pub mod translator;

use thiserror::Error;

/// Errors that can occur during AI operations.
#[derive(Debug, Error)]
pub enum AiError {
    /// HTTP request to LLM provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-specific error.
    #[error("Provider error: {message}")]
    Provider {
        /// Description of what went wrong.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}
