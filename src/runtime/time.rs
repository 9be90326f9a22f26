//! Virtual time values and clock resolution units.
//!
//! All scheduling is expressed in `SimTime`, a point in virtual time
//! measured from simulation start. Textual durations from the topology
//! description ("2s", "10ms", "3h") parse through `humantime`.

use std::fmt;
use std::ops::Add;
use std::time::Duration;

use thiserror::Error;

/// A point in virtual time, measured from simulation start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime(Duration);

impl SimTime {
    pub const ZERO: SimTime = SimTime(Duration::ZERO);

    /// Parse a textual duration such as "2s", "10ms" or "3h".
    pub fn parse(text: &str) -> Result<Self, TimeParseError> {
        humantime::parse_duration(text.trim())
            .map(SimTime)
            .map_err(|_| TimeParseError {
                text: text.to_string(),
            })
    }

    pub fn from_duration(duration: Duration) -> Self {
        SimTime(duration)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Truncate to the granularity of the given resolution unit.
    pub fn truncate(&self, unit: TimeUnit) -> SimTime {
        let step = unit.as_nanos();
        let nanos = self.0.as_nanos() / step * step;
        SimTime(Duration::from_nanos(nanos as u64))
    }
}

impl From<Duration> for SimTime {
    fn from(duration: Duration) -> Self {
        SimTime(duration)
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", humantime::format_duration(self.0))
    }
}

/// Error raised for a duration string the time parser does not accept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid duration \"{text}\"")]
pub struct TimeParseError {
    pub text: String,
}

/// Resolution units for the runtime's global clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeUnit {
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    #[default]
    Nanosecond,
}

impl TimeUnit {
    /// Parse a precision tag from the topology description.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "h" => Some(TimeUnit::Hour),
            "min" => Some(TimeUnit::Minute),
            "s" => Some(TimeUnit::Second),
            "ms" => Some(TimeUnit::Millisecond),
            "us" => Some(TimeUnit::Microsecond),
            "ns" => Some(TimeUnit::Nanosecond),
            _ => None,
        }
    }

    fn as_nanos(&self) -> u128 {
        match self {
            TimeUnit::Hour => 3_600_000_000_000,
            TimeUnit::Minute => 60_000_000_000,
            TimeUnit::Second => 1_000_000_000,
            TimeUnit::Millisecond => 1_000_000,
            TimeUnit::Microsecond => 1_000,
            TimeUnit::Nanosecond => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_durations() {
        assert_eq!(
            SimTime::parse("2s").unwrap(),
            SimTime::from_duration(Duration::from_secs(2))
        );
        assert_eq!(
            SimTime::parse("10ms").unwrap(),
            SimTime::from_duration(Duration::from_millis(10))
        );
        assert_eq!(
            SimTime::parse("3h").unwrap(),
            SimTime::from_duration(Duration::from_secs(3 * 3600))
        );
        assert_eq!(SimTime::parse("0s").unwrap(), SimTime::ZERO);
    }

    #[test]
    fn test_parse_rejects_bad_durations() {
        assert!(SimTime::parse("").is_err());
        assert!(SimTime::parse("fast").is_err());
        assert!(SimTime::parse("5x").is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(SimTime::parse("1s").unwrap() < SimTime::parse("2s").unwrap());
        assert!(SimTime::parse("999ms").unwrap() < SimTime::parse("1s").unwrap());
    }

    #[test]
    fn test_truncate_to_resolution() {
        let time = SimTime::from_duration(Duration::from_micros(1500));
        assert_eq!(
            time.truncate(TimeUnit::Millisecond),
            SimTime::from_duration(Duration::from_millis(1))
        );
        assert_eq!(time.truncate(TimeUnit::Nanosecond), time);
    }

    #[test]
    fn test_precision_tags() {
        assert_eq!(TimeUnit::from_tag("ns"), Some(TimeUnit::Nanosecond));
        assert_eq!(TimeUnit::from_tag("min"), Some(TimeUnit::Minute));
        assert_eq!(TimeUnit::from_tag("fortnight"), None);
    }
}
