//! Filtering of the task list.
//!
//! Five independent criteria, combined with AND. Evaluation is a linear scan
//! re-run on every criteria change; `today` is passed in so results are
//! reproducible.

use chrono::{Duration, Local, NaiveDate};

use crate::fields::{DayBucket, Priority, Status, StatusFilter};
use crate::task::Task;

/// Criteria for `filter_tasks`. The default value passes every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Case-insensitive substring of the title.
    pub text: String,
    pub status: StatusFilter,
    /// Exact, raw-string match against the task date.
    pub date: Option<String>,
    pub day: DayBucket,
    pub priority: Option<Priority>,
}

impl FilterCriteria {
    /// True when no criterion is narrowing the list.
    pub fn is_default(&self) -> bool {
        self.text.is_empty()
            && self.status == StatusFilter::All
            && self.date.as_deref().map_or(true, str::is_empty)
            && self.day == DayBucket::All
            && self.priority.is_none()
    }

    /// Reset every criterion to "all".
    pub fn clear(&mut self) {
        *self = FilterCriteria::default();
    }

    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        let matches_text = task.title.to_lowercase().contains(&self.text.to_lowercase());
        let matches_status = match self.status {
            StatusFilter::All => true,
            StatusFilter::Pending => task.status == Status::Pending,
            StatusFilter::Completed => task.status == Status::Completed,
        };
        let matches_date = match self.date.as_deref() {
            None | Some("") => true,
            Some(d) => task.date.as_deref() == Some(d),
        };
        let matches_day = match self.day {
            DayBucket::All => true,
            bucket => task_day(task).map_or(false, |d| in_bucket(d, bucket, today)),
        };
        let matches_priority = self.priority.map_or(true, |p| task.priority == p);

        matches_text && matches_status && matches_date && matches_day && matches_priority
    }
}

/// Tasks matching `criteria`, in store order.
pub fn filter_tasks<'a>(tasks: &'a [Task], criteria: &FilterCriteria, today: NaiveDate) -> Vec<&'a Task> {
    tasks.iter().filter(|t| criteria.matches(t, today)).collect()
}

/// `filter_tasks` against the device-local current date.
pub fn filter_tasks_now<'a>(tasks: &'a [Task], criteria: &FilterCriteria) -> Vec<&'a Task> {
    filter_tasks(tasks, criteria, Local::now().date_naive())
}

/// Calendar day of a task, if its date parses as `YYYY-MM-DD`.
pub fn task_day(task: &Task) -> Option<NaiveDate> {
    task.date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
}

fn in_bucket(day: NaiveDate, bucket: DayBucket, today: NaiveDate) -> bool {
    match bucket {
        DayBucket::All => true,
        DayBucket::Today => day == today,
        DayBucket::Tomorrow => day == today + Duration::days(1),
        DayBucket::Week => day >= today && day <= today + Duration::days(7),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskId;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    fn task(id: &str, title: &str, date: Option<&str>, status: Status, priority: Priority) -> Task {
        Task {
            id: TaskId::from(id),
            title: title.into(),
            date: date.map(str::to_string),
            time: None,
            status,
            priority,
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task("1", "Pay rent", Some("2025-04-01"), Status::Pending, Priority::High),
            task("2", "Buy milk", Some("2025-04-02"), Status::Completed, Priority::Low),
            task("3", "Book dentist", Some("2025-04-08"), Status::Pending, Priority::Medium),
            task("4", "Read", None, Status::Pending, Priority::Low),
            task("5", "Old bill", Some("2025-03-31"), Status::Completed, Priority::High),
            task("6", "Odd date", Some("April 1st"), Status::Pending, Priority::Low),
        ]
    }

    fn ids(found: &[&Task]) -> Vec<String> {
        found.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn default_criteria_return_everything_in_order() {
        let tasks = sample();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_default());
        assert_eq!(ids(&filter_tasks(&tasks, &criteria, today())), ["1", "2", "3", "4", "5", "6"]);
    }

    #[test]
    fn text_is_case_insensitive_substring() {
        let tasks = sample();
        let criteria = FilterCriteria { text: "RENT".into(), ..Default::default() };
        assert_eq!(ids(&filter_tasks(&tasks, &criteria, today())), ["1"]);
    }

    #[test]
    fn status_filter() {
        let tasks = sample();
        let done = FilterCriteria { status: StatusFilter::Completed, ..Default::default() };
        assert_eq!(ids(&filter_tasks(&tasks, &done, today())), ["2", "5"]);
        let pending = FilterCriteria { status: StatusFilter::Pending, ..Default::default() };
        assert_eq!(ids(&filter_tasks(&tasks, &pending, today())), ["1", "3", "4", "6"]);
    }

    #[test]
    fn exact_date_compares_raw_strings() {
        let tasks = sample();
        let criteria = FilterCriteria { date: Some("April 1st".into()), ..Default::default() };
        assert_eq!(ids(&filter_tasks(&tasks, &criteria, today())), ["6"]);
        let empty = FilterCriteria { date: Some(String::new()), ..Default::default() };
        assert_eq!(filter_tasks(&tasks, &empty, today()).len(), tasks.len());
    }

    #[test]
    fn today_bucket_excludes_neighbouring_days() {
        let tasks = sample();
        let criteria = FilterCriteria { day: DayBucket::Today, ..Default::default() };
        assert_eq!(ids(&filter_tasks(&tasks, &criteria, today())), ["1"]);
    }

    #[test]
    fn tomorrow_and_week_buckets() {
        let tasks = sample();
        let tomorrow = FilterCriteria { day: DayBucket::Tomorrow, ..Default::default() };
        assert_eq!(ids(&filter_tasks(&tasks, &tomorrow, today())), ["2"]);
        let week = FilterCriteria { day: DayBucket::Week, ..Default::default() };
        assert_eq!(ids(&filter_tasks(&tasks, &week, today())), ["1", "2", "3"]);
    }

    #[test]
    fn criteria_combine_with_and() {
        let tasks = sample();
        let criteria = FilterCriteria {
            status: StatusFilter::Pending,
            day: DayBucket::Week,
            priority: Some(Priority::Medium),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &criteria, today())), ["3"]);
    }

    #[test]
    fn clear_resets_to_default() {
        let mut criteria = FilterCriteria {
            text: "x".into(),
            status: StatusFilter::Completed,
            date: Some("2025-04-01".into()),
            day: DayBucket::Week,
            priority: Some(Priority::High),
        };
        assert!(!criteria.is_default());
        criteria.clear();
        assert_eq!(criteria, FilterCriteria::default());
    }
}
