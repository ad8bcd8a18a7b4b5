//! # Opswatch SLA — scheduled notification tasks per customer
//!
//! Recurring and one-off reminder tasks attached to customer entries,
//! with interval-based due computation on calendar days.

pub mod scheduler;

pub use scheduler::{DueNotification, NotificationInterval, SlaReport, SlaScheduler};
