//! Runtime configuration types shared by the core and the server.
//!
//! Loading and validating the configuration file is the server's job; the
//! types here are already validated.

mod config_store;
mod scheduler;

pub use config_store::{ConfigStore, ConfigWatcher};
pub use scheduler::{
    CLEANUP_PERIOD, CLEANUP_TIME, DEFAULT_GRACE_DAYS, DEFAULT_NOTIFICATION_HOUR,
    DEFAULT_SUBMISSION_CAP, DEFAULT_TASK_TIMEOUT, NOTIFICATION_PERIOD, SchedulerConfig,
};
