#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Execution of model-translated queries.
//!
//! Takes a [`feed_log_ai::translator::TranslatedQuery`], rewrites its
//! ISO timestamp strings into real dates ([`convert`]), runs it against a
//! [`feed_log_database::FeedRunStore`] ([`executor`]), and shapes the rows
//! for presentation ([`display`]).

pub mod convert;
pub mod display;
pub mod executor;

pub use executor::{QueryOutcome, QueryResult, execute};

/// Errors that can occur while executing a translated query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The store rejected or failed the query.
    #[error(transparent)]
    Database(#[from] feed_log_database::DbError),

    /// A pipeline stage was not an object.
    #[error("Pipeline stage {index} must be an object")]
    InvalidStage {
        /// Zero-based position of the stage.
        index: usize,
    },
}
