//! Serde helpers for persisted timestamps.
//!
//! Timestamps are written as RFC 3339 strings. Reading also accepts a bare
//! number of seconds since 2001-01-01T00:00:00Z, which is how records written
//! by the earlier desktop app encoded dates.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de, Deserializer, Serializer};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
const REFERENCE_EPOCH_OFFSET: i64 = 978_307_200;

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    deserializer.deserialize_any(TimestampVisitor)
}

pub(crate) fn from_reference_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() { return None; }
    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole >= i64::MAX as f64 { return None; }
    let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
    DateTime::from_timestamp((whole as i64).checked_add(REFERENCE_EPOCH_OFFSET)?, nanos)
}

struct TimestampVisitor;

impl<'de> de::Visitor<'de> for TimestampVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an RFC 3339 string or seconds since 2001-01-01")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        DateTime::parse_from_rfc3339(v).map(|dt| dt.with_timezone(&Utc)).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        from_reference_seconds(v).ok_or_else(|| E::custom(format!("timestamp out of range: {v}")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> { self.visit_f64(v as f64) }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> { self.visit_f64(v as f64) }
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_some(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        deserializer.deserialize_option(OptionVisitor)
    }

    struct OptionVisitor;

    impl<'de> de::Visitor<'de> for OptionVisitor {
        type Value = Option<DateTime<Utc>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("null or a timestamp")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> { Ok(None) }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> { Ok(None) }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            super::deserialize(deserializer).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        at: DateTime<Utc>,
        #[serde(with = "super::option", default)]
        due: Option<DateTime<Utc>>,
    }

    #[test]
    fn reads_reference_epoch_seconds() {
        let w: Wrapper = serde_json::from_str(r#"{"at": 0, "due": 777600.5}"#).unwrap();
        assert_eq!(w.at, Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap());
        let due = w.due.unwrap();
        assert_eq!(due.timestamp(), 978_307_200 + 777_600);
        assert_eq!(due.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn writes_rfc3339_and_reads_it_back() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap() + chrono::Duration::nanoseconds(123_456_789);
        let json = serde_json::to_string(&Wrapper { at, due: None }).unwrap();
        assert_eq!(json, r#"{"at":"2026-10-19T08:30:00.123456789Z","due":null}"#);
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, at);
        assert!(back.due.is_none());
    }

    #[test]
    fn huge_numbers_are_rejected() {
        assert!(from_reference_seconds(1e30).is_none());
        assert!(from_reference_seconds(-1e30).is_none());
        assert!(from_reference_seconds(9.2e18).is_none());
        assert!(serde_json::from_str::<Wrapper>(r#"{"at": 1e30}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"at": 0, "due": 18446744073709551615}"#).is_err());
    }

    #[test]
    fn missing_due_date_is_none() {
        let w: Wrapper = serde_json::from_str(r#"{"at":"2026-01-01T00:00:00Z"}"#).unwrap();
        assert!(w.due.is_none());
    }
}
