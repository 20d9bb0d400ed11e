//! Filter, sort, and pipeline document builders for feed run queries.
//!
//! These are pure functions so the exact documents sent to the store can be
//! checked without a database.

use bson::{Bson, Document, doc};
use chrono::{DateTime, Utc};
use feed_log_database_models::FeedRunFilter;
use feed_log_feed_run_models::{SortField, SortOrder};

/// Secondary indexes on the feed run collection, as `(field, direction)`.
pub const INDEXED_FIELDS: &[(&str, i32)] = &[
    ("timestamp", -1),
    ("transactionSourceName", 1),
    ("country_code", 1),
    ("status", 1),
];

/// Builds one key document per entry of [`INDEXED_FIELDS`].
#[must_use]
pub fn index_keys() -> Vec<Document> {
    INDEXED_FIELDS
        .iter()
        .map(|(field, direction)| {
            let mut keys = Document::new();
            keys.insert(*field, *direction);
            keys
        })
        .collect()
}

fn date(value: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(value.timestamp_millis()))
}

/// Builds the filter document for a dashboard listing.
#[must_use]
pub fn build_filter(filter: &FeedRunFilter) -> Document {
    let mut out = Document::new();

    if filter.start.is_some() || filter.end.is_some() {
        let mut range = Document::new();
        if let Some(start) = filter.start {
            range.insert("$gte", date(start));
        }
        if let Some(end) = filter.end {
            range.insert("$lte", date(end));
        }
        out.insert("timestamp", range);
    }

    if let Some(client) = &filter.client {
        out.insert("transactionSourceName", client.as_str());
    }
    if let Some(country) = &filter.country {
        out.insert("country_code", country.as_str());
    }
    if let Some(status) = &filter.status {
        out.insert("status", status.as_str());
    }

    out
}

/// Builds the sort document for a dashboard listing.
#[must_use]
pub fn build_sort(field: SortField, order: SortOrder) -> Document {
    let mut sort = Document::new();
    sort.insert(field.as_ref(), order.direction());
    sort
}

/// Pipeline computing the earliest and latest `timestamp` in one group.
#[must_use]
pub fn timestamp_range_pipeline() -> Vec<Document> {
    vec![doc! {
        "$group": {
            "_id": Bson::Null,
            "minDate": { "$min": "$timestamp" },
            "maxDate": { "$max": "$timestamp" },
        }
    }]
}

/// Keeps the string values of a distinct result, sorted and deduplicated.
#[must_use]
pub fn distinct_strings(values: Vec<Bson>) -> Vec<String> {
    let mut out: Vec<String> = values
        .into_iter()
        .filter_map(|v| match v {
            Bson::String(s) => Some(s),
            _ => None,
        })
        .collect();
    out.sort();
    out.dedup();
    out
}
