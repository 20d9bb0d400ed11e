//! Request validation for the dashboard and chat endpoints.
//!
//! Each check produces the exact user-facing message returned in the 400
//! body.

use chrono::{DateTime, NaiveDate, Utc};
use feed_log_database_models::{FeedRunFilter, FeedRunQuery};
use feed_log_feed_run_models::{SortField, SortOrder};
use feed_log_server_models::DashboardQueryParams;
use serde_json::Value;

/// Longest accepted question, in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

/// A rejected request, carrying the message for the response body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

/// Validates dashboard query parameters and builds the page query.
///
/// Empty parameters are treated as absent.
///
/// # Errors
///
/// Returns [`ValidationError`] naming the first invalid parameter.
pub fn dashboard_query(params: &DashboardQueryParams) -> Result<FeedRunQuery, ValidationError> {
    let page = match present(params.page.as_ref()) {
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|page| *page >= 1)
            .ok_or(ValidationError("Invalid page number"))?,
        None => 1,
    };

    let limit = match present(params.limit.as_ref()) {
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|limit| (1..=FeedRunQuery::MAX_LIMIT).contains(limit))
            .ok_or(ValidationError("Invalid limit (must be between 1 and 1000)"))?,
        None => FeedRunQuery::DEFAULT_LIMIT,
    };

    let sort_by = match present(params.sort_by.as_ref()) {
        Some(raw) => raw
            .parse::<SortField>()
            .map_err(|_| ValidationError("Invalid sort field"))?,
        None => SortField::default(),
    };

    let sort_order = parse_sort_order(params.sort_order.as_ref())?;

    let start = present(params.start_date.as_ref())
        .map(|raw| parse_date(raw).ok_or(ValidationError("Invalid start date")))
        .transpose()?;
    let end = present(params.end_date.as_ref())
        .map(|raw| parse_date(raw).ok_or(ValidationError("Invalid end date")))
        .transpose()?;

    Ok(FeedRunQuery {
        filter: FeedRunFilter {
            start,
            end,
            client: present(params.client.as_ref()).map(ToString::to_string),
            country: present(params.country.as_ref()).map(ToString::to_string),
            status: present(params.status.as_ref()).map(ToString::to_string),
        },
        sort_by,
        sort_order,
        page,
        limit,
    })
}

/// Parses an optional `asc`/`desc` value, defaulting to descending.
///
/// # Errors
///
/// Returns [`ValidationError`] for anything other than `asc` or `desc`.
pub fn parse_sort_order(raw: Option<&String>) -> Result<SortOrder, ValidationError> {
    present(raw).map_or(Ok(SortOrder::default()), |raw| {
        raw.parse()
            .map_err(|_| ValidationError("Invalid sort order"))
    })
}

/// Validates a chat question and returns it as a string.
///
/// # Errors
///
/// Returns [`ValidationError`] if the question is missing, not a string,
/// blank, or longer than [`MAX_QUESTION_CHARS`].
pub fn question(value: &Value) -> Result<&str, ValidationError> {
    let question = match value {
        Value::Null | Value::Bool(false) => return Err(ValidationError("Question is required")),
        Value::String(s) if s.is_empty() => return Err(ValidationError("Question is required")),
        Value::Number(n) if n.as_f64() == Some(0.0) => {
            return Err(ValidationError("Question is required"));
        }
        Value::String(s) => s,
        _ => return Err(ValidationError("Question must be a string")),
    };

    if question.trim().is_empty() {
        return Err(ValidationError("Question cannot be empty"));
    }

    if question.chars().count() > MAX_QUESTION_CHARS {
        return Err(ValidationError("Question is too long (max 500 characters)"));
    }

    Ok(question)
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}
