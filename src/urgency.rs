//! Due-date urgency classification.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::task::{Task, TaskStatus};

/// Window for [`Urgency::DueWithin12h`], in hours.
pub const DUE_WITHIN_12H_HOURS: i64 = 12;
/// Window for [`Urgency::DueSoon`], in hours.
pub const DUE_SOON_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    None,
    DueSoon,
    DueWithin12h,
    Overdue,
}

/// Classify a due date relative to `now`.
///
/// Status does not affect the result; callers that never flag done tasks
/// apply that at display time (see [`TaskView::is_overdue`]).
pub fn classify(now: DateTime<Utc>, due_date: Option<DateTime<Utc>>, _status: TaskStatus) -> Urgency {
    let Some(due) = due_date else {
        return Urgency::None;
    };
    if due < now {
        return Urgency::Overdue;
    }
    let remaining = due - now;
    if remaining <= Duration::hours(DUE_WITHIN_12H_HOURS) {
        Urgency::DueWithin12h
    } else if remaining <= Duration::hours(DUE_SOON_HOURS) {
        Urgency::DueSoon
    } else {
        Urgency::None
    }
}

/// Whole hours left until `due`, rounded up. `None` once the date has passed.
pub fn hours_remaining(now: DateTime<Utc>, due: DateTime<Utc>) -> Option<i64> {
    if due < now {
        return None;
    }
    let millis = (due - now).num_milliseconds();
    Some((millis + 3_600_000 - 1) / 3_600_000)
}

/// A task annotated for display at a given instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_remaining: Option<i64>,
    pub is_overdue: bool,
}

impl TaskView {
    pub fn at(task: Task, now: DateTime<Utc>) -> Self {
        let urgency = classify(now, task.due_date, task.status);
        let hours_remaining = match urgency {
            Urgency::DueWithin12h => task.due_date.and_then(|due| hours_remaining(now, due)),
            _ => None,
        };
        let is_overdue = urgency == Urgency::Overdue && task.status != TaskStatus::Done;
        Self {
            task,
            urgency,
            hours_remaining,
            is_overdue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, TaskId, TaskPriority};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn reference_points() {
        let now = now();
        let todo = TaskStatus::ToDo;
        assert_eq!(classify(now, Some(now + Duration::hours(1)), todo), Urgency::DueWithin12h);
        assert_eq!(classify(now, Some(now + Duration::hours(30)), todo), Urgency::DueSoon);
        assert_eq!(classify(now, Some(now - Duration::hours(1)), todo), Urgency::Overdue);
        assert_eq!(classify(now, Some(now + Duration::hours(72)), todo), Urgency::None);
        for status in TaskStatus::ALL {
            assert_eq!(classify(now, None, status), Urgency::None);
        }
    }

    #[test]
    fn boundaries_use_exact_durations() {
        let now = now();
        let within_12h = Duration::hours(DUE_WITHIN_12H_HOURS);
        let soon = Duration::hours(DUE_SOON_HOURS);
        let todo = TaskStatus::ToDo;
        assert_eq!(classify(now, Some(now), todo), Urgency::DueWithin12h);
        assert_eq!(classify(now, Some(now + within_12h), todo), Urgency::DueWithin12h);
        assert_eq!(
            classify(now, Some(now + within_12h + Duration::milliseconds(1)), todo),
            Urgency::DueSoon
        );
        assert_eq!(classify(now, Some(now + soon), todo), Urgency::DueSoon);
        assert_eq!(
            classify(now, Some(now + soon + Duration::seconds(1)), todo),
            Urgency::None
        );
        assert_eq!(
            classify(now, Some(now - Duration::milliseconds(1)), todo),
            Urgency::Overdue
        );
    }

    #[test]
    fn done_tasks_still_classify_overdue() {
        let now = now();
        assert_eq!(
            classify(now, Some(now - Duration::hours(2)), TaskStatus::Done),
            Urgency::Overdue
        );
    }

    #[test]
    fn hours_remaining_rounds_up() {
        let now = now();
        assert_eq!(hours_remaining(now, now + Duration::minutes(61)), Some(2));
        assert_eq!(hours_remaining(now, now + Duration::hours(3)), Some(3));
        assert_eq!(hours_remaining(now, now), Some(0));
        assert_eq!(hours_remaining(now, now - Duration::minutes(1)), None);
    }

    #[test]
    fn view_suppresses_overdue_flag_for_done_tasks() {
        let now = now();
        let mut task = Task::from_new(
            TaskId::generate(),
            NewTask {
                heading: "Late".to_string(),
                details: None,
                status: TaskStatus::InProgress,
                priority: TaskPriority::High,
                creation_date: now - Duration::days(3),
                due_date: Some(now - Duration::hours(1)),
            },
        );
        let view = TaskView::at(task.clone(), now);
        assert_eq!(view.urgency, Urgency::Overdue);
        assert!(view.is_overdue);

        task.status = TaskStatus::Done;
        let view = TaskView::at(task, now);
        assert_eq!(view.urgency, Urgency::Overdue);
        assert!(!view.is_overdue);
    }

    #[test]
    fn view_serializes_flat() {
        let now = now();
        let task = Task::from_new(
            TaskId::generate(),
            NewTask {
                heading: "Soon".to_string(),
                details: None,
                status: TaskStatus::ToDo,
                priority: TaskPriority::Low,
                creation_date: now,
                due_date: Some(now + Duration::minutes(90)),
            },
        );
        let value = serde_json::to_value(TaskView::at(task, now)).expect("serialize");
        assert_eq!(value["heading"], "Soon");
        assert_eq!(value["urgency"], "dueWithin12h");
        assert_eq!(value["hoursRemaining"], 2);
        assert_eq!(value["isOverdue"], false);
    }
}
