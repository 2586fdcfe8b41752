use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::RecordId;
use crate::record::{Record, TimedObject};

/// A persisted to-do item. The daemon schedules against `complete_date` /
/// `notify_date`; everything else is display metadata for the UI process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub complete_date: DateTime<Utc>,
    #[serde(default)]
    pub notify_date: Option<DateTime<Utc>>,
    /// Recurrence period in days; `None` means one-shot.
    #[serde(default)]
    pub repeat: Option<u32>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub category: Option<RecordId>,
}

impl Task {
    pub fn new(title: impl Into<String>, complete_date: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            title: title.into(),
            description: String::new(),
            complete_date,
            notify_date: None,
            repeat: None,
            done: false,
            important: false,
            category: None,
        }
    }

    /// Not done and past its deadline.
    pub fn is_missed(&self) -> bool {
        !self.done && self.complete_date < Utc::now()
    }
}

impl Record for Task {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl TimedObject for Task {
    fn complete_date(&self) -> DateTime<Utc> {
        self.complete_date
    }

    fn notify_date(&self) -> Option<DateTime<Utc>> {
        self.notify_date
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

/// User-defined task grouping. Not timed — exists to exercise the generic
/// store with a second record type and to back the UI's category filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            color: None,
        }
    }
}

impl Record for Category {
    fn id(&self) -> RecordId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn target_time_prefers_future_notify_date() {
        let mut task = Task::new("standup", Utc::now() + Duration::minutes(30));
        task.notify_date = Some(Utc::now() + Duration::minutes(20));
        assert_eq!(task.target_time(), task.notify_date.unwrap());
    }

    #[test]
    fn target_time_falls_back_to_deadline_when_notify_passed() {
        let mut task = Task::new("standup", Utc::now() + Duration::minutes(30));
        task.notify_date = Some(Utc::now() - Duration::minutes(5));
        assert_eq!(task.target_time(), task.complete_date);
    }

    #[test]
    fn missed_requires_overdue_and_not_done() {
        let mut task = Task::new("report", Utc::now() - Duration::hours(1));
        assert!(task.is_missed());
        task.done = true;
        assert!(!task.is_missed());
    }

    #[test]
    fn task_serde_round_trip() {
        let mut task = Task::new("water plants", Utc::now() + Duration::hours(2));
        task.repeat = Some(7);
        task.important = true;
        let json = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.id, task.id);
        assert_eq!(decoded.repeat, Some(7));
        assert!(decoded.important);
    }
}
