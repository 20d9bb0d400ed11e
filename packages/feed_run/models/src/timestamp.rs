//! Timestamp rendering shared by every API response.
//!
//! Timestamps go out as RFC 3339 with millisecond precision and a `Z`
//! suffix (`2025-07-01T06:30:00.000Z`), whether they come from a typed
//! record or from a raw store document.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

/// Formats `value` as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[must_use]
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `serialize_with` helper for a `DateTime<Utc>` field.
///
/// # Errors
///
/// Propagates the serializer's error.
pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(value))
}

/// `serialize_with` helper for an optional `DateTime<Utc>` field.
///
/// # Errors
///
/// Propagates the serializer's error.
#[allow(clippy::ref_option)]
pub fn serialize_option<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_str(&format(value)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_seconds_still_carry_millis() {
        let value: DateTime<Utc> = "2025-07-02T06:00:00Z".parse().unwrap();
        assert_eq!(format(&value), "2025-07-02T06:00:00.000Z");
    }

    #[test]
    fn sub_second_precision_is_truncated_to_millis() {
        let value: DateTime<Utc> = "2025-07-02T06:00:00.123456Z".parse().unwrap();
        assert_eq!(format(&value), "2025-07-02T06:00:00.123Z");
    }
}
