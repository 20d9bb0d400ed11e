#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Feed run record types shared across the feed log system.
//!
//! A feed run is one logged execution of a client's job-processing feed for
//! a given day and country. The field names mirror the stored document
//! layout (`transactionSourceName`, `country_code`, `progress.*`), so the
//! same names appear in the API, the stored collection, and the prompts sent
//! to the model.

pub mod count;
pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Per-run pipeline stage throughput counters.
///
/// Counters may have been written as 32-bit, 64-bit, or floating point
/// numbers depending on the writer and are read through
/// [`count::deserialize`]. Every field is required here; stored documents
/// that predate a counter are read leniently by the database models.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Progress {
    /// Whether the run switched the live index over to the new data.
    pub switch_index: bool,
    /// Raw records present in the feed file.
    #[serde(deserialize_with = "count::deserialize")]
    pub total_records_in_feed: i64,
    /// Jobs that failed to be indexed.
    #[serde(deserialize_with = "count::deserialize")]
    pub total_jobs_fail_indexed: i64,
    /// Jobs parsed out of the feed.
    #[serde(deserialize_with = "count::deserialize")]
    pub total_jobs_in_feed: i64,
    /// Jobs sent to the enrichment stage.
    #[serde(deserialize_with = "count::deserialize")]
    pub total_jobs_sent_to_enrich: i64,
    /// Jobs lacking metadata.
    #[serde(deserialize_with = "count::deserialize")]
    pub total_jobs_dont_have_metadata: i64,
    /// Jobs lacking metadata (second-generation check).
    #[serde(deserialize_with = "count::deserialize")]
    pub total_jobs_dont_have_metadata_v2: i64,
    /// Jobs sent to the index.
    #[serde(deserialize_with = "count::deserialize")]
    pub total_jobs_sent_to_index: i64,
}

/// A single feed run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRun {
    /// Unique run identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// ISO country code the feed was run for (e.g. `"US"`).
    pub country_code: String,
    /// ISO currency code of the feed (e.g. `"USD"`).
    pub currency_code: String,
    /// Pipeline stage counters.
    pub progress: Progress,
    /// Free-text run status (e.g. `"completed"`, `"failed"`).
    pub status: String,
    /// When the run happened.
    #[serde(serialize_with = "timestamp::serialize")]
    pub timestamp: DateTime<Utc>,
    /// Client (transaction source) name.
    #[serde(rename = "transactionSourceName")]
    pub transaction_source_name: String,
    /// Records without coordinates.
    #[serde(rename = "noCoordinatesCount", deserialize_with = "count::deserialize")]
    pub no_coordinates_count: i64,
    /// Total records in the run.
    #[serde(rename = "recordCount", deserialize_with = "count::deserialize")]
    pub record_count: i64,
    /// Records with a unique reference number.
    #[serde(rename = "uniqueRefNumberCount", deserialize_with = "count::deserialize")]
    pub unique_ref_number_count: i64,
}

/// Fields the dashboard may sort by.
///
/// The string form is the stored field path, so it can be used directly as
/// a sort key.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum SortField {
    /// Run timestamp.
    #[default]
    #[serde(rename = "timestamp")]
    #[strum(serialize = "timestamp")]
    Timestamp,
    /// Client name.
    #[serde(rename = "transactionSourceName")]
    #[strum(serialize = "transactionSourceName")]
    TransactionSourceName,
    /// Country code.
    #[serde(rename = "country_code")]
    #[strum(serialize = "country_code")]
    CountryCode,
    /// Run status.
    #[serde(rename = "status")]
    #[strum(serialize = "status")]
    Status,
    /// `progress.TOTAL_JOBS_IN_FEED`
    #[serde(rename = "progress.TOTAL_JOBS_IN_FEED")]
    #[strum(serialize = "progress.TOTAL_JOBS_IN_FEED")]
    TotalJobsInFeed,
    /// `progress.TOTAL_JOBS_SENT_TO_INDEX`
    #[serde(rename = "progress.TOTAL_JOBS_SENT_TO_INDEX")]
    #[strum(serialize = "progress.TOTAL_JOBS_SENT_TO_INDEX")]
    TotalJobsSentToIndex,
    /// `progress.TOTAL_JOBS_FAIL_INDEXED`
    #[serde(rename = "progress.TOTAL_JOBS_FAIL_INDEXED")]
    #[strum(serialize = "progress.TOTAL_JOBS_FAIL_INDEXED")]
    TotalJobsFailIndexed,
    /// Record count.
    #[serde(rename = "recordCount")]
    #[strum(serialize = "recordCount")]
    RecordCount,
}

impl SortField {
    /// Returns all sortable fields.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Timestamp,
            Self::TransactionSourceName,
            Self::CountryCode,
            Self::Status,
            Self::TotalJobsInFeed,
            Self::TotalJobsSentToIndex,
            Self::TotalJobsFailIndexed,
            Self::RecordCount,
        ]
    }
}

/// Sort direction.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Returns the direction as a store sort value (`1` or `-1`).
    #[must_use]
    pub const fn direction(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_round_trips_through_stored_path() {
        for field in SortField::all() {
            let parsed: SortField = field.as_ref().parse().unwrap();
            assert_eq!(parsed, *field);
        }
        assert!("progress.SWITCH_INDEX".parse::<SortField>().is_err());
        assert!("Timestamp".parse::<SortField>().is_err());
    }

    #[test]
    fn sort_order_parses_lowercase_only() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("ASC".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Desc.direction(), -1);
    }

    #[test]
    fn feed_run_reads_feed_json() {
        let run: FeedRun = serde_json::from_value(serde_json::json!({
            "_id": "deal1-us-2025-07-01",
            "country_code": "US",
            "currency_code": "USD",
            "progress": {
                "SWITCH_INDEX": true,
                "TOTAL_RECORDS_IN_FEED": 120,
                "TOTAL_JOBS_FAIL_INDEXED": 3,
                "TOTAL_JOBS_IN_FEED": 118,
                "TOTAL_JOBS_SENT_TO_ENRICH": 117,
                "TOTAL_JOBS_DONT_HAVE_METADATA": 1,
                "TOTAL_JOBS_DONT_HAVE_METADATA_V2": 0,
                "TOTAL_JOBS_SENT_TO_INDEX": 115.0
            },
            "status": "completed",
            "timestamp": "2025-07-01T06:30:00.000Z",
            "transactionSourceName": "Deal1",
            "noCoordinatesCount": 4,
            "recordCount": 120,
            "uniqueRefNumberCount": 119
        }))
        .unwrap();

        assert_eq!(run.transaction_source_name, "Deal1");
        assert!(run.progress.switch_index);
        assert_eq!(run.progress.total_jobs_sent_to_index, 115);
        assert_eq!(run.timestamp.to_rfc3339(), "2025-07-01T06:30:00+00:00");
    }

    #[test]
    fn feed_run_requires_top_level_fields() {
        let result = serde_json::from_value::<FeedRun>(serde_json::json!({
            "_id": "x",
            "country_code": "US"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn progress_requires_every_counter() {
        let result =
            serde_json::from_value::<Progress>(serde_json::json!({ "TOTAL_JOBS_IN_FEED": 7 }));
        assert!(result.is_err());
    }

    #[test]
    fn feed_run_timestamp_serializes_with_millis() {
        let run = FeedRun {
            id: "r1".to_string(),
            country_code: "US".to_string(),
            currency_code: "USD".to_string(),
            progress: Progress::default(),
            status: "completed".to_string(),
            timestamp: "2025-07-02T06:00:00Z".parse().unwrap(),
            transaction_source_name: "Deal1".to_string(),
            no_coordinates_count: 0,
            record_count: 0,
            unique_ref_number_count: 0,
        };
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["timestamp"], "2025-07-02T06:00:00.000Z");
    }
}
