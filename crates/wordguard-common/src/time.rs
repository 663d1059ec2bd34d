// ============================================
// File: crates/wordguard-common/src/time.rs
// ============================================
//! # Time Utilities
//!
//! ## Creation Reason
//! Two clocks matter to wordguard: a monotonic one for connection
//! activity tracking, and a coarse wall clock that both peers feed into
//! the game commitment.
//!
//! ## Main Functionality
//! - `ActivityClock`: lock-free last-activity timestamp
//! - `MinuteStamp`: UTC wall-clock time truncated to the minute
//!
//! ## Main Logical Flow
//! 1. Each connection owns an `ActivityClock` touched on every frame
//! 2. Idle closes and the connection debug view read it without locks
//! 3. Server and client each take a `MinuteStamp` when a game starts and
//!    render it as RFC 3339 inside the commitment pre-image
//!
//! ## ⚠️ Important Note for Next Developer
//! - `ActivityClock` has millisecond resolution and never moves backwards
//! - The `MinuteStamp` text format is part of the wire contract: changing
//!   it breaks commitment confirmation against older peers
//! - A game started in the last seconds of a minute can produce stamps
//!   that differ by one minute between peers; the client also tries
//!   `previous()` before giving up on confirmation
//!
//! ## Last Modified
//! v0.1.0 - Initial time utilities

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use chrono::{DateTime, DurationRound, SecondsFormat, Utc};

// ============================================
// ActivityClock
// ============================================

/// Last-activity timestamp that many tasks may read and bump without a
/// lock.
///
/// Holds milliseconds since a process-wide origin, so it only works for
/// instants taken after the first clock in the process was created.
///
/// # Example
/// ```
/// use wordguard_common::time::ActivityClock;
/// use std::time::Duration;
///
/// let clock = ActivityClock::start();
/// clock.touch();
/// assert!(clock.idle_for() < Duration::from_secs(60));
/// ```
#[derive(Debug)]
pub struct ActivityClock {
    millis: AtomicU64,
}

fn origin() -> Instant {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    *ORIGIN.get_or_init(Instant::now)
}

#[allow(clippy::cast_possible_truncation)]
fn millis_now() -> u64 {
    origin().elapsed().as_millis() as u64
}

impl ActivityClock {
    /// A clock whose last activity is now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            millis: AtomicU64::new(millis_now()),
        }
    }

    /// Records activity now.
    pub fn touch(&self) {
        self.millis.fetch_max(millis_now(), Ordering::Relaxed);
    }

    /// Time since the last recorded activity.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        let last = self.millis.load(Ordering::Relaxed);
        Duration::from_millis(millis_now().saturating_sub(last))
    }
}

impl Default for ActivityClock {
    fn default() -> Self {
        Self::start()
    }
}

// ============================================
// MinuteStamp
// ============================================

/// UTC wall-clock time truncated to the start of its minute.
///
/// Renders as RFC 3339 with whole seconds and a `Z` suffix, for example
/// `2020-05-23T04:24:00Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MinuteStamp(DateTime<Utc>);

impl MinuteStamp {
    /// Takes the current minute.
    #[must_use]
    pub fn now() -> Self {
        Self::truncate(Utc::now())
    }

    /// Truncates an arbitrary UTC time to its minute.
    #[must_use]
    pub fn truncate(at: DateTime<Utc>) -> Self {
        // Truncation only fails for times outside chrono's range.
        let truncated = at
            .duration_trunc(chrono::Duration::minutes(1))
            .unwrap_or(at);
        Self(truncated)
    }

    /// The minute before this one.
    #[must_use]
    pub fn previous(&self) -> Self {
        Self(self.0 - chrono::Duration::minutes(1))
    }

    /// Returns the underlying time.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the canonical text form used in commitments.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl fmt::Display for MinuteStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for MinuteStamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::truncate(at)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn parse(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_activity_clock_starts_fresh() {
        let clock = ActivityClock::start();
        assert!(clock.idle_for() < Duration::from_millis(100));
    }

    #[test]
    fn test_activity_clock_idles_and_resets() {
        let clock = ActivityClock::start();
        thread::sleep(Duration::from_millis(20));
        assert!(clock.idle_for() >= Duration::from_millis(20));

        clock.touch();
        assert!(clock.idle_for() < Duration::from_millis(20));
    }

    #[test]
    fn test_minute_stamp_truncates() {
        let stamp = MinuteStamp::truncate(parse("2020-05-23T04:24:37.512Z"));
        assert_eq!(stamp.to_rfc3339(), "2020-05-23T04:24:00Z");
        assert_eq!(stamp.to_string(), "2020-05-23T04:24:00Z");
    }

    #[test]
    fn test_minute_stamp_same_minute_equal() {
        let a = MinuteStamp::from(parse("2020-05-23T04:24:01Z"));
        let b = MinuteStamp::from(parse("2020-05-23T04:24:59Z"));
        let c = MinuteStamp::from(parse("2020-05-23T04:25:00Z"));
        assert_eq!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_minute_stamp_previous_crosses_hour() {
        let stamp = MinuteStamp::from(parse("2020-05-23T05:00:03Z"));
        assert_eq!(stamp.previous().to_rfc3339(), "2020-05-23T04:59:00Z");
        assert!(stamp.previous() < stamp);
    }

    #[test]
    fn test_minute_stamp_normalizes_offset() {
        let local = DateTime::parse_from_rfc3339("2020-05-23T06:24:10+02:00")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(MinuteStamp::truncate(local).to_rfc3339(), "2020-05-23T04:24:00Z");
    }
}
