use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// RFC 3339 timestamp as written by the remote store, second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub OffsetDateTime);

impl Timestamp {
    pub fn new(datetime: OffsetDateTime) -> Self {
        Self(datetime)
    }

    pub fn inner(&self) -> &OffsetDateTime {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self.0.format(&Rfc3339).map_err(|_| fmt::Error)?;
        write!(f, "{formatted}")
    }
}

impl FromStr for Timestamp {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let datetime = OffsetDateTime::parse(s, &Rfc3339)
            .map_err(|e| CoreError::invalid_timestamp(format!("'{s}': {e}")))?;
        Ok(Timestamp(datetime))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = self.0.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Current UTC time truncated to whole seconds.
pub fn now_utc() -> Timestamp {
    let now = OffsetDateTime::now_utc();
    Timestamp(now.replace_nanosecond(0).unwrap_or(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_timestamp_display() {
        let ts = Timestamp::new(datetime!(2024-05-15 14:30:00 UTC));
        assert_eq!(ts.to_string(), "2024-05-15T14:30:00Z");
    }

    #[test]
    fn test_timestamp_from_str_with_offset() {
        let ts = Timestamp::from_str("2024-05-15T14:30:00+02:00").unwrap();
        assert_eq!(
            ts.0.to_offset(time::UtcOffset::UTC),
            datetime!(2024-05-15 12:30:00 UTC)
        );
    }

    #[test]
    fn test_timestamp_from_str_invalid() {
        assert!(Timestamp::from_str("yesterday").is_err());
        assert!(Timestamp::from_str("2024-13-01T00:00:00Z").is_err());
        assert!(Timestamp::from_str("").is_err());
    }

    #[test]
    fn test_timestamp_serde() {
        let ts: Timestamp = serde_json::from_str("\"2024-05-15T14:30:00Z\"").unwrap();
        assert_eq!(ts.0, datetime!(2024-05-15 14:30:00 UTC));
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2024-05-15T14:30:00Z\"");
    }

    #[test]
    fn test_now_utc_has_second_precision() {
        assert_eq!(now_utc().0.nanosecond(), 0);
    }
}
