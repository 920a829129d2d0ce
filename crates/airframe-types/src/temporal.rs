use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock instant in nanoseconds since the Unix epoch.
///
/// Serialized as a bare signed 64-bit integer, the representation used on
/// the wire for `createdAt` and `lastUpdatedAt`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from explicit nanoseconds.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// The current wall-clock time.
    ///
    /// Clocks before the epoch collapse to zero; clocks past the `i64` range
    /// (year 2262) saturate.
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Self(i64::try_from(nanos).unwrap_or(i64::MAX))
    }

    /// The epoch itself.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Nanoseconds since the epoch.
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ns)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_zero() {
        assert!(Timestamp::now() > Timestamp::zero());
    }

    #[test]
    fn now_is_monotonic_enough() {
        let a = Timestamp::now();
        let b = Timestamp::now();
        assert!(b >= a);
    }

    #[test]
    fn serializes_as_integer() {
        let ts = Timestamp::from_nanos(1_700_000_000_123_456_789);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1700000000123456789");
        let parsed: Timestamp = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.as_nanos(), 42);
    }

    #[test]
    fn debug_format() {
        assert_eq!(format!("{:?}", Timestamp::from_nanos(5)), "Timestamp(5ns)");
    }
}
