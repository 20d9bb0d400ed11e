#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Stored document types and query parameter definitions.
//!
//! These types represent feed runs as stored in and retrieved from the
//! document collection. They are distinct from the domain [`FeedRun`] in
//! `feed_log_feed_run_models` (which carries a `chrono` timestamp) and from
//! the API response types in `feed_log_server_models`.

use chrono::{DateTime, Utc};
use feed_log_feed_run_models::{FeedRun, Progress, SortField, SortOrder, count, timestamp};
use serde::{Deserialize, Serialize};

/// A feed run document as stored in the collection.
///
/// The timestamp is a native store date so range filters compare dates
/// rather than strings. Everything except `_id` and `timestamp` is optional
/// on read, since documents written by older producers may omit fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRunDocument {
    /// Unique run identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// Country code.
    #[serde(default)]
    pub country_code: String,
    /// Currency code.
    #[serde(default)]
    pub currency_code: String,
    /// Pipeline stage counters.
    #[serde(default, deserialize_with = "deserialize_stored_progress")]
    pub progress: Progress,
    /// Run status.
    #[serde(default)]
    pub status: String,
    /// When the run happened.
    pub timestamp: bson::DateTime,
    /// Client name.
    #[serde(rename = "transactionSourceName", default)]
    pub transaction_source_name: String,
    /// Records without coordinates.
    #[serde(
        rename = "noCoordinatesCount",
        default,
        deserialize_with = "count::deserialize_or_zero"
    )]
    pub no_coordinates_count: i64,
    /// Total records in the run.
    #[serde(rename = "recordCount", default, deserialize_with = "count::deserialize_or_zero")]
    pub record_count: i64,
    /// Records with a unique reference number.
    #[serde(
        rename = "uniqueRefNumberCount",
        default,
        deserialize_with = "count::deserialize_or_zero"
    )]
    pub unique_ref_number_count: i64,
}

/// Stored counters, any of which may be missing or `null`.
#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct StoredProgress {
    #[serde(default)]
    switch_index: Option<bool>,
    #[serde(default, deserialize_with = "count::deserialize_or_zero")]
    total_records_in_feed: i64,
    #[serde(default, deserialize_with = "count::deserialize_or_zero")]
    total_jobs_fail_indexed: i64,
    #[serde(default, deserialize_with = "count::deserialize_or_zero")]
    total_jobs_in_feed: i64,
    #[serde(default, deserialize_with = "count::deserialize_or_zero")]
    total_jobs_sent_to_enrich: i64,
    #[serde(default, deserialize_with = "count::deserialize_or_zero")]
    total_jobs_dont_have_metadata: i64,
    #[serde(default, deserialize_with = "count::deserialize_or_zero")]
    total_jobs_dont_have_metadata_v2: i64,
    #[serde(default, deserialize_with = "count::deserialize_or_zero")]
    total_jobs_sent_to_index: i64,
}

fn deserialize_stored_progress<'de, D>(deserializer: D) -> Result<Progress, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let stored = Option::<StoredProgress>::deserialize(deserializer)?;
    Ok(stored.map_or_else(Progress::default, |p| Progress {
        switch_index: p.switch_index.unwrap_or_default(),
        total_records_in_feed: p.total_records_in_feed,
        total_jobs_fail_indexed: p.total_jobs_fail_indexed,
        total_jobs_in_feed: p.total_jobs_in_feed,
        total_jobs_sent_to_enrich: p.total_jobs_sent_to_enrich,
        total_jobs_dont_have_metadata: p.total_jobs_dont_have_metadata,
        total_jobs_dont_have_metadata_v2: p.total_jobs_dont_have_metadata_v2,
        total_jobs_sent_to_index: p.total_jobs_sent_to_index,
    }))
}

impl From<FeedRun> for FeedRunDocument {
    fn from(run: FeedRun) -> Self {
        Self {
            id: run.id,
            country_code: run.country_code,
            currency_code: run.currency_code,
            progress: run.progress,
            status: run.status,
            timestamp: bson::DateTime::from_millis(run.timestamp.timestamp_millis()),
            transaction_source_name: run.transaction_source_name,
            no_coordinates_count: run.no_coordinates_count,
            record_count: run.record_count,
            unique_ref_number_count: run.unique_ref_number_count,
        }
    }
}

impl From<FeedRunDocument> for FeedRun {
    fn from(doc: FeedRunDocument) -> Self {
        Self {
            id: doc.id,
            country_code: doc.country_code,
            currency_code: doc.currency_code,
            progress: doc.progress,
            status: doc.status,
            timestamp: bson_to_chrono(doc.timestamp),
            transaction_source_name: doc.transaction_source_name,
            no_coordinates_count: doc.no_coordinates_count,
            record_count: doc.record_count,
            unique_ref_number_count: doc.unique_ref_number_count,
        }
    }
}

/// Converts a store date to a `chrono` timestamp.
///
/// Dates outside `chrono`'s representable range collapse to the Unix epoch.
#[must_use]
pub fn bson_to_chrono(value: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

/// Equality and range filters for listing feed runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedRunFilter {
    /// Inclusive lower bound on `timestamp`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub end: Option<DateTime<Utc>>,
    /// Exact client name.
    pub client: Option<String>,
    /// Exact country code.
    pub country: Option<String>,
    /// Exact status label.
    pub status: Option<String>,
}

/// A page request for feed runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRunQuery {
    /// Record filter.
    pub filter: FeedRunFilter,
    /// Field to sort by.
    pub sort_by: SortField,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// One-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
}

impl FeedRunQuery {
    /// Default page size when none is requested.
    pub const DEFAULT_LIMIT: u64 = 50;
    /// Largest page size a caller may request.
    pub const MAX_LIMIT: u64 = 1000;

    /// Number of records to skip before this page.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for FeedRunQuery {
    fn default() -> Self {
        Self {
            filter: FeedRunFilter::default(),
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Fields whose distinct values populate the dashboard filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistinctField {
    /// `transactionSourceName`
    Client,
    /// `country_code`
    Country,
    /// `status`
    Status,
}

impl DistinctField {
    /// Stored field name.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Client => "transactionSourceName",
            Self::Country => "country_code",
            Self::Status => "status",
        }
    }
}

/// Earliest and latest run timestamps in the collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampRange {
    /// Earliest timestamp, `None` when the collection is empty.
    #[serde(serialize_with = "timestamp::serialize_option")]
    pub min_date: Option<DateTime<Utc>>,
    /// Latest timestamp, `None` when the collection is empty.
    #[serde(serialize_with = "timestamp::serialize_option")]
    pub max_date: Option<DateTime<Utc>>,
}
