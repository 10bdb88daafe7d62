use time::macros::time;
use time::{Duration, Time, UtcOffset};

/// Local time of day the cleanup task fires.
pub const CLEANUP_TIME: Time = time!(02:00);
/// Interval between two cleanup runs.
pub const CLEANUP_PERIOD: Duration = Duration::WEEK;
/// Interval between two notification runs.
pub const NOTIFICATION_PERIOD: Duration = Duration::DAY;

pub const DEFAULT_NOTIFICATION_HOUR: u8 = 8;
pub const DEFAULT_GRACE_DAYS: u32 = 30;
pub const DEFAULT_SUBMISSION_CAP: usize = 150;
pub const DEFAULT_TASK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(600);

/// Settings read by both schedulers at the start of every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Local time of day of the daily notification run.
    pub notification_time: Time,
    /// Days an event stays archived after notification before deletion.
    pub grace_days: u32,
    /// Maximum number of submissions included in one email.
    pub submission_cap: usize,
    /// Offset that defines "local" for dates and run times.
    pub utc_offset: UtcOffset,
    /// Upper bound for a single run of either task.
    pub task_timeout: std::time::Duration,
}

impl SchedulerConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::days(i64::from(self.grace_days))
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            notification_time: time!(08:00),
            grace_days: DEFAULT_GRACE_DAYS,
            submission_cap: DEFAULT_SUBMISSION_CAP,
            utc_offset: UtcOffset::UTC,
            task_timeout: DEFAULT_TASK_TIMEOUT,
        }
    }
}
