//! Time and timestamp helpers.

use chrono::{DateTime, Duration, Utc};

// Well inside chrono's representable range.
const MAX_SECS: i64 = i64::MAX / 1_000_000;

/// UTC timestamp used for occupancy marks, segment start/stop, `last_changed`.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whole seconds between two timestamps, never negative.
#[must_use]
pub fn elapsed_secs(from: Timestamp, to: Timestamp) -> u64 {
    u64::try_from((to - from).num_seconds()).unwrap_or(0)
}

/// Build a [`Duration`] from whole seconds, saturating on overflow.
#[must_use]
pub fn secs(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX).min(MAX_SECS))
}
