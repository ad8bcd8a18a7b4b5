//! SLA Scheduler — due computation for customer notification tasks
//!
//! Features:
//! - Fixed interval table: Once, Weekly, Monthly, Bi-Monthly, Quarterly,
//!   Half-yearly, Yearly (one-letter codes in the persisted config)
//! - Due iff never triggered, or the last trigger is at least the
//!   interval length ago (calendar days)
//! - Firing stamps the trigger date; one-shot tasks are removed from the
//!   entry after the pass
//! - Unrecognized interval codes are skipped with a warning and left in
//!   the config untouched
//! - Non-fatal validation on `add_notification`: unknown customer,
//!   unknown interval code, and unparseable dates abort that call only

use chrono::NaiveDate;
use opswatch_core::customers::{CustomerStore, Notification};
use opswatch_core::{OpswatchError, OpswatchResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Recognized notification intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NotificationInterval {
    Once,
    Weekly,
    Monthly,
    BiMonthly,
    Quarterly,
    HalfYearly,
    Yearly,
}

impl NotificationInterval {
    /// Parse the persisted one-letter code.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "O" => Some(Self::Once),
            "W" => Some(Self::Weekly),
            "M" => Some(Self::Monthly),
            "BM" => Some(Self::BiMonthly),
            "Q" => Some(Self::Quarterly),
            "H" => Some(Self::HalfYearly),
            "Y" => Some(Self::Yearly),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Once => "O",
            Self::Weekly => "W",
            Self::Monthly => "M",
            Self::BiMonthly => "BM",
            Self::Quarterly => "Q",
            Self::HalfYearly => "H",
            Self::Yearly => "Y",
        }
    }

    /// Interval length in calendar days.
    pub fn days(&self) -> i64 {
        match self {
            Self::Once => 0,
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::BiMonthly => 61,
            Self::Quarterly => 91,
            Self::HalfYearly => 182,
            Self::Yearly => 365,
        }
    }

    pub fn is_one_shot(&self) -> bool {
        matches!(self, Self::Once)
    }

    /// Due when never triggered, or triggered at least `days()` ago.
    pub fn is_due(&self, triggered: Option<NaiveDate>, today: NaiveDate) -> bool {
        match triggered {
            None => true,
            Some(last) => (today - last).num_days() >= self.days(),
        }
    }
}

impl std::fmt::Display for NotificationInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Once => "once",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::BiMonthly => "bi-monthly",
            Self::Quarterly => "quarterly",
            Self::HalfYearly => "half-yearly",
            Self::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

/// One fired notification, ready for the operator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DueNotification {
    pub customer_id: u64,
    pub customer: String,
    pub task: String,
    pub interval: NotificationInterval,
    pub text: String,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SlaReport {
    pub fired: u64,
    pub one_shots_consumed: u64,
    pub unknown_intervals_skipped: u64,
}

// ── SLA Scheduler Engine ────────────────────────────────────────────────────

pub struct SlaScheduler {
    store: Arc<CustomerStore>,
    fired: AtomicU64,
    one_shots_consumed: AtomicU64,
    unknown_skipped: AtomicU64,
}

impl SlaScheduler {
    pub fn new(store: Arc<CustomerStore>) -> Self {
        Self {
            store,
            fired: AtomicU64::new(0),
            one_shots_consumed: AtomicU64::new(0),
            unknown_skipped: AtomicU64::new(0),
        }
    }

    /// Compute and fire everything due as of `today`. Fired notifications
    /// get `triggered = today`; one-shot tasks are removed from their
    /// entry. The store is persisted afterwards.
    pub fn due_notifications(&self, today: NaiveDate) -> OpswatchResult<Vec<DueNotification>> {
        let mut due = Vec::new();

        self.store.with_entries_mut(|entries| {
            for entry in entries.iter_mut() {
                let mut consumed = Vec::new();
                for (idx, notification) in entry.notifications.iter_mut().enumerate() {
                    let Some(interval) = NotificationInterval::parse(&notification.interval) else {
                        warn!(
                            customer = %entry.description,
                            task = %notification.task,
                            code = %notification.interval,
                            "Unknown notification interval, task skipped"
                        );
                        self.unknown_skipped.fetch_add(1, Ordering::Relaxed);
                        continue;
                    };
                    if !interval.is_due(notification.triggered, today) {
                        continue;
                    }

                    notification.triggered = Some(today);
                    self.fired.fetch_add(1, Ordering::Relaxed);
                    if interval.is_one_shot() {
                        consumed.push(idx);
                        self.one_shots_consumed.fetch_add(1, Ordering::Relaxed);
                    }
                    due.push(DueNotification {
                        customer_id: entry.id,
                        customer: entry.description.clone(),
                        task: notification.task.clone(),
                        interval,
                        text: format!(
                            "SLA task due for {}: {} ({})",
                            entry.description, notification.task, interval
                        ),
                    });
                }
                for idx in consumed.into_iter().rev() {
                    entry.notifications.remove(idx);
                }
            }
        });

        if !due.is_empty() {
            info!(due = due.len(), "SLA notifications fired");
        }
        self.store.save()?;
        Ok(due)
    }

    /// Attach a notification task to a customer. Unknown customer,
    /// unknown interval code, and unparseable trigger dates are each
    /// reported and abort this call without touching the store. On
    /// success the entry's ticket-creation flag is raised and the store
    /// persisted.
    pub fn add_notification(
        &self,
        customer: &str,
        task: &str,
        interval_code: &str,
        triggered: Option<&str>,
    ) -> OpswatchResult<()> {
        if NotificationInterval::parse(interval_code).is_none() {
            warn!(customer = %customer, code = %interval_code, "Unknown interval code, notification not added");
            return Err(OpswatchError::UnknownInterval(interval_code.to_string()));
        }
        let triggered = match triggered {
            None => None,
            Some(text) => match NaiveDate::parse_from_str(text, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    warn!(customer = %customer, date = %text, "Invalid date, notification not added");
                    return Err(OpswatchError::InvalidDate(text.to_string()));
                }
            },
        };

        let updated = self.store.update(customer, |entry| {
            entry.notifications.push(Notification {
                task: task.to_string(),
                interval: interval_code.to_string(),
                triggered,
            });
            entry.create_ticket = true;
        });
        if let Err(e) = updated {
            warn!(customer = %customer, error = %e, "Notification not added");
            return Err(e);
        }

        info!(customer = %customer, task = %task, interval = %interval_code, "Notification added");
        self.store.save()
    }

    // ── Stats ───────────────────────────────────────────────────────────

    pub fn report(&self) -> SlaReport {
        SlaReport {
            fired: self.fired.load(Ordering::Relaxed),
            one_shots_consumed: self.one_shots_consumed.load(Ordering::Relaxed),
            unknown_intervals_skipped: self.unknown_skipped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store_with(notifications: Vec<Notification>) -> Arc<CustomerStore> {
        let store = Arc::new(CustomerStore::in_memory());
        store.ensure_entry("Acme", "Veeam");
        store.update("Acme", |e| e.notifications = notifications).unwrap();
        store
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    #[test]
    fn test_weekly_due_boundaries() {
        let weekly = NotificationInterval::Weekly;
        assert!(!weekly.is_due(Some(today()), today()));
        assert!(!weekly.is_due(Some(today() - Duration::days(6)), today()));
        assert!(weekly.is_due(Some(today() - Duration::days(7)), today()));
        assert!(weekly.is_due(None, today()));
    }

    #[test]
    fn test_quarterly_due_boundaries() {
        let quarterly = NotificationInterval::Quarterly;
        assert!(!quarterly.is_due(Some(today() - Duration::days(90)), today()));
        assert!(quarterly.is_due(Some(today() - Duration::days(91)), today()));
    }

    #[test]
    fn test_fired_notification_stamped_today() {
        let store = store_with(vec![Notification {
            task: "Check backup SLA".into(),
            interval: "W".into(),
            triggered: Some(today() - Duration::days(10)),
        }]);
        let scheduler = SlaScheduler::new(store.clone());

        let due = scheduler.due_notifications(today()).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].interval, NotificationInterval::Weekly);

        let acme = store.find("Acme").unwrap();
        assert_eq!(acme.notifications[0].triggered, Some(today()));

        // Immediately re-running fires nothing.
        let due = scheduler.due_notifications(today()).unwrap();
        assert!(due.is_empty());
    }

    #[test]
    fn test_one_shot_consumed() {
        let store = store_with(vec![
            Notification { task: "Migration reminder".into(), interval: "O".into(), triggered: None },
            Notification { task: "Weekly report".into(), interval: "W".into(), triggered: None },
        ]);
        let scheduler = SlaScheduler::new(store.clone());

        let due = scheduler.due_notifications(today()).unwrap();
        assert_eq!(due.len(), 2);

        let acme = store.find("Acme").unwrap();
        assert_eq!(acme.notifications.len(), 1);
        assert_eq!(acme.notifications[0].task, "Weekly report");
        assert_eq!(scheduler.report().one_shots_consumed, 1);
    }

    #[test]
    fn test_unknown_interval_left_untouched() {
        let store = store_with(vec![Notification {
            task: "Mystery task".into(),
            interval: "X".into(),
            triggered: None,
        }]);
        let scheduler = SlaScheduler::new(store.clone());

        let due = scheduler.due_notifications(today()).unwrap();
        assert!(due.is_empty());
        assert_eq!(scheduler.report().unknown_intervals_skipped, 1);

        let acme = store.find("Acme").unwrap();
        assert_eq!(acme.notifications.len(), 1);
        assert_eq!(acme.notifications[0].interval, "X");
        assert_eq!(acme.notifications[0].triggered, None);
    }

    #[test]
    fn test_add_notification_validation() {
        let store = store_with(vec![]);
        let scheduler = SlaScheduler::new(store.clone());

        let err = scheduler.add_notification("Acme", "t", "Z", None).unwrap_err();
        assert!(matches!(err, OpswatchError::UnknownInterval(_)));

        let err = scheduler.add_notification("Acme", "t", "M", Some("06-08-2026")).unwrap_err();
        assert!(matches!(err, OpswatchError::InvalidDate(_)));

        let err = scheduler.add_notification("Nobody", "t", "M", None).unwrap_err();
        assert!(matches!(err, OpswatchError::CustomerNotFound(_)));

        // Nothing was added by the failed calls.
        assert!(store.find("Acme").unwrap().notifications.is_empty());

        scheduler.add_notification("Acme", "Quarterly review", "Q", Some("2026-05-01")).unwrap();
        let acme = store.find("Acme").unwrap();
        assert_eq!(acme.notifications.len(), 1);
        assert_eq!(acme.notifications[0].triggered, NaiveDate::from_ymd_opt(2026, 5, 1));
        assert!(acme.create_ticket);
    }
}
