#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the feed log server.
//!
//! These types are serialized to JSON for the REST API. Query parameters are
//! kept as raw strings here so the server can report exactly which one is
//! malformed instead of failing the whole extraction.

use chrono::{DateTime, Utc};
use feed_log_database_models::TimestampRange;
use feed_log_feed_run_models::{FeedRun, timestamp};
use feed_log_query::QueryOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Questions offered to users who do not know what to ask.
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "Average jobs indexed per client last month",
    "Show all failed jobs from Deal1",
    "Total jobs processed by country this week",
    "Which client has the highest success rate?",
    "Jobs that failed indexing in the last 7 days",
    "Average processing time by client",
];

/// Query parameters for the dashboard data endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQueryParams {
    /// One-based page number.
    pub page: Option<String>,
    /// Page size.
    pub limit: Option<String>,
    /// Stored field path to sort by.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
    /// Inclusive lower bound on the run timestamp.
    pub start_date: Option<String>,
    /// Inclusive upper bound on the run timestamp.
    pub end_date: Option<String>,
    /// Exact client name.
    pub client: Option<String>,
    /// Exact country code.
    pub country: Option<String>,
    /// Exact status label.
    pub status: Option<String>,
}

/// Pagination metadata for a dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The page returned.
    pub current_page: u64,
    /// Number of pages at this page size.
    pub total_pages: u64,
    /// Number of records matching the filter.
    pub total_count: u64,
    /// Page size.
    pub limit: u64,
    /// Whether a later page exists.
    pub has_next_page: bool,
    /// Whether an earlier page exists.
    pub has_prev_page: bool,
}

impl Pagination {
    /// Computes pagination for `total_count` records split into pages of
    /// `limit`.
    #[must_use]
    pub const fn new(page: u64, limit: u64, total_count: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_count.div_ceil(limit)
        };

        Self {
            current_page: page,
            total_pages,
            total_count,
            limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// Response from the dashboard data endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPage {
    /// Feed runs on this page.
    pub data: Vec<FeedRun>,
    /// Pagination metadata.
    pub pagination: Pagination,
}

/// Values for populating the dashboard filter controls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Distinct client names, sorted.
    pub clients: Vec<String>,
    /// Distinct country codes, sorted.
    pub countries: Vec<String>,
    /// Distinct status labels, sorted.
    pub statuses: Vec<String>,
    /// Earliest and latest run timestamps.
    pub date_range: TimestampRange,
}

/// Body of a chat query.
///
/// `question` is left untyped so a non-string value can be rejected with a
/// specific message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQueryRequest {
    /// The user's question.
    #[serde(default)]
    pub question: Value,
    /// Flattened result column to sort rows by.
    pub sort_by: Option<String>,
    /// `asc` or `desc`; defaults to `desc` when `sort_by` is set.
    pub sort_order: Option<String>,
}

/// Response from the chat query endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatQueryResponse {
    /// The question as asked.
    pub question: String,
    /// Query outcome envelope.
    pub response: QueryOutcome,
    /// When the answer was produced.
    #[serde(serialize_with = "timestamp::serialize")]
    pub timestamp: DateTime<Utc>,
}

/// Example questions for the chat UI.
#[derive(Debug, Clone, Serialize)]
pub struct ChatExamples {
    /// Suggested questions.
    pub examples: Vec<String>,
}

impl Default for ChatExamples {
    fn default() -> Self {
        Self {
            examples: EXAMPLE_QUESTIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Error body returned with 4xx and 5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// User-facing message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_pages_rounds_up() {
        let p = Pagination::new(1, 50, 101);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next_page);
        assert!(!p.has_prev_page);

        let p = Pagination::new(3, 50, 101);
        assert!(!p.has_next_page);
        assert!(p.has_prev_page);
    }

    #[test]
    fn empty_collection_has_no_pages() {
        let p = Pagination::new(1, 50, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next_page);
        assert!(!p.has_prev_page);
    }

    #[test]
    fn pagination_serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(2, 10, 25)).unwrap();
        assert_eq!(
            json,
            json!({
                "currentPage": 2,
                "totalPages": 3,
                "totalCount": 25,
                "limit": 10,
                "hasNextPage": true,
                "hasPrevPage": true,
            })
        );
    }

    #[test]
    fn dashboard_params_use_camel_case_names() {
        let params: DashboardQueryParams = serde_json::from_value(json!({
            "sortBy": "recordCount",
            "sortOrder": "asc",
            "startDate": "2025-07-01",
        }))
        .unwrap();
        assert_eq!(params.sort_by.as_deref(), Some("recordCount"));
        assert_eq!(params.sort_order.as_deref(), Some("asc"));
        assert_eq!(params.start_date.as_deref(), Some("2025-07-01"));
        assert!(params.page.is_none());
    }

    #[test]
    fn chat_request_tolerates_any_question_type() {
        let req: ChatQueryRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.question.is_null());
        let req: ChatQueryRequest = serde_json::from_value(json!({ "question": 42 })).unwrap();
        assert_eq!(req.question, json!(42));
    }

    #[test]
    fn filter_options_shape() {
        let options = FilterOptions {
            clients: vec!["Deal1".to_string()],
            countries: vec![],
            statuses: vec!["failed".to_string()],
            date_range: TimestampRange::default(),
        };
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({
                "clients": ["Deal1"],
                "countries": [],
                "statuses": ["failed"],
                "dateRange": { "minDate": null, "maxDate": null },
            })
        );
    }

    #[test]
    fn failed_chat_response_shape() {
        let response = ChatQueryResponse {
            question: "poem?".to_string(),
            response: QueryOutcome::failure("Not about feed runs."),
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["question"], "poem?");
        assert_eq!(
            json["response"],
            json!({ "success": false, "error": "Not about feed runs.", "data": null })
        );
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn examples_default_to_fixed_list() {
        assert_eq!(ChatExamples::default().examples.len(), EXAMPLE_QUESTIONS.len());
    }
}
