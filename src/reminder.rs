//! Due-time reminders.
//!
//! Each task with a parseable date and time gets at most one reminder, fired
//! `lead` minutes before it is due. Reminders live in a time-ordered schedule
//! keyed by task id, so a deleted task's reminder can be cancelled and an
//! edited task's reminder replaced. The schedule is polled from the event
//! loop; nothing here spawns threads or sleeps.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LeadOutOfRange;
use crate::task::{Task, TaskId};

/// Minutes between a reminder and the due time.
pub const DEFAULT_LEAD_MINUTES: i64 = 15;

/// Largest accepted reminder lead (one week).
pub const MAX_LEAD_MINUTES: i64 = 7 * 24 * 60;

/// Longest delay a single timer can be armed for (2^31 - 1 ms). Longer
/// delays are clamped and fire at the cap.
pub const MAX_TIMER_DELAY_MS: i64 = 2_147_483_647;

/// Title used for system notifications.
pub const NOTIFICATION_TITLE: &str = "Task Reminder";

/// Whether reminders may be shown as system notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not yet asked.
    #[default]
    Default,
    Granted,
    Denied,
}

impl Permission {
    pub fn needs_request(self) -> bool {
        self == Permission::Default
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Permission::Default => "Permission not requested",
            Permission::Granted => "Permission granted",
            Permission::Denied => "Permission denied",
        }
    }
}

/// Where reminders end up.
pub trait Notifier {
    /// Non-blocking system notification.
    fn notify(&mut self, title: &str, body: &str);
    /// Blocking message that must be dismissed.
    fn alert(&mut self, message: &str);
}

/// A reminder that has come due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub task_id: TaskId,
    pub title: String,
    pub fire_at: DateTime<Local>,
    pub lead_minutes: i64,
}

impl Reminder {
    pub fn message(&self) -> String {
        format!("⏰ {} minutes left for: {}", self.lead_minutes, self.title)
    }
}

/// Show `reminder` as a notification when permitted, as an alert otherwise.
pub fn deliver<N: Notifier + ?Sized>(reminder: &Reminder, permission: Permission, notifier: &mut N) {
    let message = reminder.message();
    info!(id = %reminder.task_id, ?permission, "delivering reminder");
    if permission == Permission::Granted {
        notifier.notify(NOTIFICATION_TITLE, &message);
    } else {
        notifier.alert(&message);
    }
}

/// Local instant a task is due, if both its date and time parse.
pub fn due_instant(date: Option<&str>, time: Option<&str>) -> Option<DateTime<Local>> {
    let date = NaiveDate::parse_from_str(date?.trim(), "%Y-%m-%d").ok()?;
    let time = time?.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    Local
        .from_local_datetime(&NaiveDateTime::new(date, time))
        .earliest()
}

/// Pending reminders, ordered by fire instant.
#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    lead: Duration,
    queue: BTreeMap<(DateTime<Local>, TaskId), Reminder>,
    armed: HashMap<TaskId, DateTime<Local>>,
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        ReminderScheduler {
            lead: Duration::minutes(DEFAULT_LEAD_MINUTES),
            queue: BTreeMap::new(),
            armed: HashMap::new(),
        }
    }
}

impl ReminderScheduler {
    pub fn new(lead_minutes: i64) -> Result<Self, LeadOutOfRange> {
        let lead = Duration::try_minutes(lead_minutes)
            .filter(|_| (0..=MAX_LEAD_MINUTES).contains(&lead_minutes))
            .ok_or(LeadOutOfRange(lead_minutes))?;
        Ok(ReminderScheduler {
            lead,
            ..ReminderScheduler::default()
        })
    }

    pub fn lead_minutes(&self) -> i64 {
        self.lead.num_minutes()
    }

    /// Instant the reminder for `task` should fire, ignoring the timer cap.
    pub fn reminder_instant(&self, task: &Task) -> Option<DateTime<Local>> {
        due_instant(task.date.as_deref(), task.time.as_deref()).map(|due| due - self.lead)
    }

    /// Arm the reminder for `task`, replacing any it already had.
    ///
    /// Returns the fire instant, or `None` when the task has no usable
    /// schedule or its reminder instant is not in the future.
    pub fn schedule(&mut self, task: &Task, now: DateTime<Local>) -> Option<DateTime<Local>> {
        self.cancel(&task.id);

        let Some(remind_at) = self.reminder_instant(task) else {
            debug!(id = %task.id, "no reminder: date/time missing or unparseable");
            return None;
        };
        let delay = remind_at - now;
        if delay <= Duration::zero() {
            debug!(id = %task.id, %remind_at, "no reminder: instant already passed");
            return None;
        }

        let fire_at = now + delay.min(Duration::milliseconds(MAX_TIMER_DELAY_MS));
        self.queue.insert(
            (fire_at, task.id.clone()),
            Reminder {
                task_id: task.id.clone(),
                title: task.title.clone(),
                fire_at,
                lead_minutes: self.lead_minutes(),
            },
        );
        self.armed.insert(task.id.clone(), fire_at);
        debug!(id = %task.id, %fire_at, "reminder armed");
        Some(fire_at)
    }

    /// Arm reminders for every task; returns how many were armed.
    pub fn schedule_all(&mut self, tasks: &[Task], now: DateTime<Local>) -> usize {
        let armed = tasks.iter().filter_map(|t| self.schedule(t, now)).count();
        info!(armed, total = tasks.len(), "reminders seeded");
        armed
    }

    /// Drop the pending reminder for `id`, if any.
    pub fn cancel(&mut self, id: &TaskId) -> bool {
        match self.armed.remove(id) {
            Some(fire_at) => {
                self.queue.remove(&(fire_at, id.clone()));
                debug!(id = %id, "reminder cancelled");
                true
            }
            None => false,
        }
    }

    /// Remove and return every reminder whose fire instant is at or before
    /// `now`, earliest first.
    pub fn take_due(&mut self, now: DateTime<Local>) -> Vec<Reminder> {
        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let reminder = entry.remove();
            self.armed.remove(&reminder.task_id);
            due.push(reminder);
        }
        due
    }

    pub fn next_fire(&self) -> Option<DateTime<Local>> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    pub fn armed_at(&self, id: &TaskId) -> Option<DateTime<Local>> {
        self.armed.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Priority, Status};

    fn due_task(id: &str, due: DateTime<Local>) -> Task {
        Task {
            id: TaskId::from(id),
            title: format!("task {id}"),
            date: Some(due.format("%Y-%m-%d").to_string()),
            time: Some(due.format("%H:%M:%S").to_string()),
            status: Status::Pending,
            priority: Priority::Medium,
        }
    }

    fn now() -> DateTime<Local> {
        // Whole seconds, so formatted due times parse back exactly.
        let n = Local::now();
        n - Duration::nanoseconds(n.timestamp_subsec_nanos() as i64)
    }

    #[derive(Default)]
    struct Recorder {
        notified: Vec<(String, String)>,
        alerted: Vec<String>,
    }

    impl Notifier for Recorder {
        fn notify(&mut self, title: &str, body: &str) {
            self.notified.push((title.to_string(), body.to_string()));
        }
        fn alert(&mut self, message: &str) {
            self.alerted.push(message.to_string());
        }
    }

    #[test]
    fn lead_must_be_in_range() {
        assert_eq!(ReminderScheduler::new(30).unwrap().lead_minutes(), 30);
        assert_eq!(ReminderScheduler::new(MAX_LEAD_MINUTES).unwrap().lead_minutes(), MAX_LEAD_MINUTES);
        assert_eq!(ReminderScheduler::new(-1).unwrap_err(), LeadOutOfRange(-1));
        assert!(ReminderScheduler::new(i64::MAX).is_err());
    }

    #[test]
    fn arms_fifteen_minutes_before_due() {
        let now = now();
        let mut s = ReminderScheduler::default();
        let fire_at = s.schedule(&due_task("a", now + Duration::minutes(35)), now).unwrap();
        assert_eq!(fire_at - now, Duration::minutes(20));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn past_reminder_instant_is_not_armed() {
        let now = now();
        let mut s = ReminderScheduler::default();
        assert_eq!(s.schedule(&due_task("a", now + Duration::minutes(10)), now), None);
        assert_eq!(s.schedule(&due_task("b", now + Duration::minutes(15)), now), None);
        assert!(s.is_empty());
    }

    #[test]
    fn missing_or_bad_schedule_is_skipped() {
        let now = now();
        let mut s = ReminderScheduler::default();
        let mut t = due_task("a", now + Duration::hours(2));
        t.date = None;
        assert_eq!(s.schedule(&t, now), None);
        t.date = Some("tomorrow-ish".into());
        assert_eq!(s.schedule(&t, now), None);
        t.date = Some("2099-01-01".into());
        t.time = None;
        assert_eq!(s.schedule(&t, now), None);
    }

    #[test]
    fn far_reminders_are_clamped_to_timer_cap() {
        let now = now();
        let mut s = ReminderScheduler::default();
        let fire_at = s.schedule(&due_task("a", now + Duration::days(60)), now).unwrap();
        assert_eq!(fire_at - now, Duration::milliseconds(MAX_TIMER_DELAY_MS));
    }

    #[test]
    fn take_due_pops_in_time_order() {
        let now = now();
        let mut s = ReminderScheduler::default();
        s.schedule(&due_task("late", now + Duration::minutes(40)), now);
        s.schedule(&due_task("early", now + Duration::minutes(20)), now);
        assert!(s.take_due(now).is_empty());
        assert_eq!(s.next_fire(), Some(now + Duration::minutes(5)));

        let fired = s.take_due(now + Duration::minutes(30));
        let ids: Vec<&str> = fired.iter().map(|r| r.task_id.as_str()).collect();
        assert_eq!(ids, ["early", "late"]);
        assert!(s.is_empty());
        assert!(s.take_due(now + Duration::hours(1)).is_empty());
    }

    #[test]
    fn cancel_and_reschedule_replace_entries() {
        let now = now();
        let mut s = ReminderScheduler::default();
        let mut t = due_task("a", now + Duration::minutes(35));
        s.schedule(&t, now);
        t.time = Some((now + Duration::minutes(65)).format("%H:%M:%S").to_string());
        t.date = Some((now + Duration::minutes(65)).format("%Y-%m-%d").to_string());
        let moved = s.schedule(&t, now).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s.armed_at(&t.id), Some(moved));

        assert!(s.cancel(&t.id));
        assert!(!s.cancel(&t.id));
        assert!(s.take_due(now + Duration::days(1)).is_empty());
    }

    #[test]
    fn parses_minute_and_second_times() {
        assert!(due_instant(Some("2030-06-01"), Some("09:00")).is_some());
        assert!(due_instant(Some("2030-06-01"), Some("09:00:30")).is_some());
        assert!(due_instant(Some("2030-06-01"), Some("9am")).is_none());
        assert!(due_instant(None, Some("09:00")).is_none());
    }

    #[test]
    fn delivery_depends_on_permission() {
        let reminder = Reminder {
            task_id: TaskId::from("a"),
            title: "Pay rent".into(),
            fire_at: Local::now(),
            lead_minutes: 15,
        };
        let mut rec = Recorder::default();
        deliver(&reminder, Permission::Granted, &mut rec);
        deliver(&reminder, Permission::Default, &mut rec);
        deliver(&reminder, Permission::Denied, &mut rec);
        assert_eq!(
            rec.notified,
            vec![(NOTIFICATION_TITLE.to_string(), "⏰ 15 minutes left for: Pay rent".to_string())]
        );
        assert_eq!(rec.alerted.len(), 2);
    }
}
