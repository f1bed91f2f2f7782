//! Time source for the date tools

use chrono::{DateTime, FixedOffset, Local};

/// Source of the current local time
pub trait Clock: Send + Sync {
    /// Current local date and time
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The system clock in the local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Parse an RFC 3339 timestamp into a fixed clock
    ///
    /// # Errors
    ///
    /// Returns the chrono parse error for malformed timestamps
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(rfc3339).map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
