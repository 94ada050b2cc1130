//! Version clock for ordering snapshots.
//!
//! The version of a store is a wall-clock timestamp in milliseconds. Wall
//! clocks can stand still or step backwards, so every new version is forced
//! strictly past the previous one.

use crate::Timestamp;

/// A source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds.
    fn now_millis(&self) -> Timestamp;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Timestamp {
        // Before-epoch clocks collapse to 0; next_version still advances.
        chrono::Utc::now().timestamp_millis().max(0) as Timestamp
    }
}

/// Clock that always reports the same instant. Useful for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now_millis(&self) -> Timestamp {
        self.0
    }
}

/// Compute the version that follows `previous` given the wall time `now`.
///
/// Returns `now` when it is ahead of `previous`, otherwise `previous + 1`.
pub fn next_version(previous: Timestamp, now: Timestamp) -> Timestamp {
    if now > previous {
        now
    } else {
        previous.saturating_add(1)
    }
}
