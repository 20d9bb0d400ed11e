#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Feed run importer.
//!
//! Downloads a JSON array of feed run records, validates every element
//! against the record schema, and bulk-inserts them into the feed run
//! collection.

use feed_log_database::{DbError, FeedRunStore};
use feed_log_feed_run_models::FeedRun;
use serde_json::Value;

/// Errors that can occur while importing a feed.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The download failed.
    #[error("Failed to download feed: {0}")]
    Http(#[from] reqwest::Error),

    /// The payload was not JSON.
    #[error("Feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload was JSON but not an array.
    #[error("Expected JSON array, got {found}")]
    NotAnArray {
        /// Kind of value found instead.
        found: &'static str,
    },

    /// An element did not match the record schema.
    #[error("Record {index} is invalid: {source}")]
    InvalidRecord {
        /// Zero-based position in the array.
        index: usize,
        /// What was wrong with it.
        source: serde_json::Error,
    },

    /// The store rejected the operation.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Result of an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records in the downloaded feed.
    pub downloaded: usize,
    /// Records written to the store.
    pub inserted: u64,
}

/// Downloads the feed at `url` as JSON.
///
/// # Errors
///
/// Returns [`ImportError`] if the request fails, the server answers with an
/// error status, or the body is not JSON.
pub async fn download_feed(client: &reqwest::Client, url: &str) -> Result<Value, ImportError> {
    log::info!("Downloading feed from {url}");
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(serde_json::from_str(&body)?)
}

/// Validates a downloaded payload as a list of feed runs.
///
/// # Errors
///
/// Returns [`ImportError::NotAnArray`] for any non-array payload and
/// [`ImportError::InvalidRecord`] for the first element missing a field
/// (including any `progress` counter) or holding a wrongly typed or `null`
/// one.
pub fn parse_feed(payload: Value) -> Result<Vec<FeedRun>, ImportError> {
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(ImportError::NotAnArray {
                found: kind(&other),
            });
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| ImportError::InvalidRecord { index, source })
        })
        .collect()
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Inserts `runs` and then ensures the collection indexes.
///
/// An insert failure (for example a duplicate `_id` from a previous import)
/// is logged and counted as zero inserted; index creation still runs.
///
/// # Errors
///
/// Returns [`ImportError::Database`] if index creation fails.
pub async fn import_runs(
    store: &dyn FeedRunStore,
    runs: Vec<FeedRun>,
    create_indexes: bool,
) -> Result<ImportSummary, ImportError> {
    let downloaded = runs.len();

    let inserted = match store.insert_runs(runs).await {
        Ok(inserted) => {
            log::info!("Inserted {inserted} of {downloaded} feed runs");
            inserted
        }
        Err(e) => {
            log::error!("Insert failed: {e}");
            0
        }
    };

    if create_indexes {
        store.ensure_indexes().await?;
        log::info!("Indexes ready");
    }

    Ok(ImportSummary {
        downloaded,
        inserted,
    })
}
