//! Lenient deserialization for stored counters.
//!
//! Feed producers write counters as integers of either width or as floating
//! point numbers. All of them are read back as `i64`. Incoming feeds must
//! carry a number for every counter, while stored documents written by older
//! producers may hold `null`, which [`deserialize_or_zero`] reads as zero.

use std::fmt;

use serde::Deserializer;
use serde::de::{self, Visitor};

/// Deserializes a counter from any numeric representation.
///
/// # Errors
///
/// Fails if the value is not numeric (including `null`), is non-finite, or
/// does not fit in an `i64`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CountVisitor { null_as_zero: false })
}

/// Like [`deserialize`], but reads `null` as zero.
///
/// # Errors
///
/// Fails if the value is neither numeric nor `null`, is non-finite, or does
/// not fit in an `i64`.
pub fn deserialize_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(CountVisitor { null_as_zero: true })
}

#[derive(Clone, Copy)]
struct CountVisitor {
    null_as_zero: bool,
}

impl CountVisitor {
    fn null<E: de::Error>(self) -> Result<i64, E> {
        if self.null_as_zero {
            Ok(0)
        } else {
            Err(E::invalid_type(de::Unexpected::Unit, &self))
        }
    }
}

impl<'de> Visitor<'de> for CountVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or floating point count")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("count {v} out of range")))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if v.is_finite() {
            Ok(v.round() as i64)
        } else {
            Err(E::custom(format!("count {v} is not finite")))
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<i64, E> {
        self.null()
    }

    fn visit_none<E: de::Error>(self) -> Result<i64, E> {
        self.null()
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(self)
    }
}
