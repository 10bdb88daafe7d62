//! Background processors.
//!
//! - `Notifier`: sends the notification email of one event and marks it notified
//! - `NotificationScheduler`: runs the notifier over today's events, daily
//! - `CleanupScheduler`: deletes events past their grace period, weekly

pub mod cleanup_scheduler;
pub mod notification_scheduler;
pub mod notifier;

pub use cleanup_scheduler::{CleanupScheduler, CleanupSummary};
pub use notification_scheduler::{NotificationScheduler, RunSummary};
pub use notifier::{Notifier, NotifyError, NotifyOutcome};
