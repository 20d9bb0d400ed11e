#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Document store access for feed runs.
//!
//! All reads and writes go through the [`FeedRunStore`] trait so the HTTP
//! layer and the query executor can be exercised without a live database.
//! [`mongo::MongoFeedRunStore`] is the production implementation; filter
//! and sort documents are built by the pure functions in [`queries`].

pub mod db;
pub mod mongo;
pub mod queries;

use bson::Document;
use feed_log_database_models::{DistinctField, FeedRunFilter, FeedRunQuery, TimestampRange};
use feed_log_feed_run_models::FeedRun;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Driver or server error.
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// A stored document could not be decoded.
    #[error("Document decode error: {0}")]
    Decode(#[from] bson::de::Error),

    /// A value could not be encoded as a document.
    #[error("Document encode error: {0}")]
    Encode(#[from] bson::ser::Error),

    /// Connection configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Read and write access to the feed run collection.
#[async_trait::async_trait]
pub trait FeedRunStore: Send + Sync {
    /// Returns one page of feed runs matching the query.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn find_page(&self, query: &FeedRunQuery) -> Result<Vec<FeedRun>, DbError>;

    /// Counts feed runs matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn count(&self, filter: &FeedRunFilter) -> Result<u64, DbError>;

    /// Returns the sorted distinct string values of a field.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn distinct_values(&self, field: DistinctField) -> Result<Vec<String>, DbError>;

    /// Returns the earliest and latest run timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn timestamp_range(&self) -> Result<TimestampRange, DbError>;

    /// Runs a raw filter document and returns at most `limit` documents.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn find_documents(&self, filter: Document, limit: i64)
    -> Result<Vec<Document>, DbError>;

    /// Runs a raw aggregation pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the pipeline fails.
    async fn aggregate_documents(&self, pipeline: Vec<Document>)
    -> Result<Vec<Document>, DbError>;

    /// Inserts feed runs and returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the insert fails.
    async fn insert_runs(&self, runs: Vec<FeedRun>) -> Result<u64, DbError>;

    /// Creates the collection's secondary indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if index creation fails.
    async fn ensure_indexes(&self) -> Result<(), DbError>;
}
