//! Calendar arithmetic for the schedulers.
//!
//! "Local" always means a fixed [`UtcOffset`] taken from configuration.

use time::{Date, Duration, OffsetDateTime, Time, UtcOffset};

/// A local calendar day as the half-open instant range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl DayWindow {
    /// The local day that contains `instant`.
    pub fn containing(instant: OffsetDateTime, offset: UtcOffset) -> Self {
        Self::for_date(instant.to_offset(offset).date(), offset)
    }

    pub fn for_date(date: Date, offset: UtcOffset) -> Self {
        let start = local_midnight(date, offset);
        Self {
            start,
            end: start + Duration::DAY,
        }
    }

    pub fn start(&self) -> OffsetDateTime {
        self.start
    }

    pub fn end(&self) -> OffsetDateTime {
        self.end
    }

    pub fn date(&self) -> Date {
        self.start.date()
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// The instant an event dated `date` is stored as.
pub fn local_midnight(date: Date, offset: UtcOffset) -> OffsetDateTime {
    date.midnight().assume_offset(offset)
}

/// Next fire instant for a task that runs at `at` local time every `period`.
///
/// Today's slot is used unless it is already in the past, in which case the
/// slot one period later is returned. The result is never before `now`.
pub fn next_run_at(
    now: OffsetDateTime,
    offset: UtcOffset,
    at: Time,
    period: Duration,
) -> OffsetDateTime {
    let local_now = now.to_offset(offset);
    let candidate = local_now.replace_time(at);
    if candidate < local_now {
        candidate + period
    } else {
        candidate
    }
}

/// Wall-clock wait between `now` and `next`, zero if `next` already passed.
pub fn wait_duration(now: OffsetDateTime, next: OffsetDateTime) -> std::time::Duration {
    let delta = next - now;
    if delta.is_negative() {
        std::time::Duration::ZERO
    } else {
        delta.unsigned_abs()
    }
}
