//! The daily renovation pass: repeating tasks whose deadline slipped into
//! the past are pushed forward by whole repeat periods and reopened, so a
//! weekly chore missed for three weeks lands on its next upcoming slot
//! instead of piling up.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use tempo_core::{dates, Task};
use tempo_store::{FileStore, Result};

/// Advance every overdue repeating task to its next future occurrence.
/// Returns how many records changed; the store is rewritten only when at
/// least one did.
pub fn renovate(store: &Arc<FileStore<Task>>) -> Result<usize> {
    let mut tasks = store.get_all(None);
    let mut changed = 0;

    for task in tasks.iter_mut() {
        let Some(repeat) = task.repeat else { continue };
        if repeat == 0 {
            continue;
        }
        let overdue = dates::days_overdue(task.complete_date);
        if overdue <= 0 {
            continue;
        }

        // Smallest whole number of periods that lands today or later.
        // Both operands are positive here, so the rounded-up division is
        // plain integer arithmetic.
        let repeat = repeat as i64;
        let advance = (overdue + repeat - 1) / repeat * repeat;
        task.complete_date += Duration::days(advance);
        if let Some(notify) = task.notify_date {
            task.notify_date = Some(notify + Duration::days(advance));
        }
        task.done = false;
        debug!(id = %task.id, advance, "repeating task renovated");
        changed += 1;
    }

    if changed > 0 {
        store.replace_all(tasks)?;
        info!(changed, "renovation rewrote the task container");
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store_in(dir: &tempfile::TempDir) -> Arc<FileStore<Task>> {
        Arc::new(FileStore::open(dir.path().join("tasks.bin")).unwrap())
    }

    #[test]
    fn overdue_weekly_task_advances_by_whole_weeks() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut task = Task::new("water plants", Utc::now() - Duration::days(14));
        task.repeat = Some(7);
        task.notify_date = Some(task.complete_date - Duration::hours(1));
        task.done = true;
        let original_complete = task.complete_date;
        let original_notify = task.notify_date.unwrap();
        store.insert(task.clone()).unwrap();

        assert_eq!(renovate(&store).unwrap(), 1);

        let renewed = store.get_by_id(task.id, None).unwrap();
        assert_eq!(renewed.complete_date, original_complete + Duration::days(14));
        assert_eq!(renewed.notify_date.unwrap(), original_notify + Duration::days(14));
        assert!(!renewed.done);
    }

    #[test]
    fn partial_period_rounds_up_to_the_next_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut task = Task::new("report", Utc::now() - Duration::days(10));
        task.repeat = Some(7);
        store.insert(task.clone()).unwrap();

        renovate(&store).unwrap();
        let renewed = store.get_by_id(task.id, None).unwrap();
        // 10 days late on a 7-day cycle: two periods forward, not one.
        assert!(renewed.complete_date > Utc::now());
        assert_eq!(
            renewed.complete_date,
            task.complete_date + Duration::days(14)
        );
    }

    #[tokio::test]
    async fn renovated_task_is_picked_up_by_the_monitor() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        // Two weeks asleep, deadline half an hour into today's schedule.
        let mut task = Task::new(
            "backup",
            Utc::now() - Duration::days(14) + Duration::minutes(30),
        );
        task.repeat = Some(7);
        task.done = true;
        store.insert(task.clone()).unwrap();

        renovate(&store).unwrap();

        let monitor = tempo_monitor::TimeMonitor::new();
        let (fired_tx, _fired_rx) = tokio::sync::mpsc::channel(8);
        monitor
            .prepare(
                Arc::new(tempo_store::StoreAdapter::new(Arc::clone(&store))),
                fired_tx,
            )
            .await;
        assert!(monitor.is_active(task.id));
    }

    #[test]
    fn one_shot_and_current_tasks_are_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let overdue_one_shot = Task::new("expired", Utc::now() - Duration::days(3));
        let mut current_weekly = Task::new("fresh", Utc::now() + Duration::days(2));
        current_weekly.repeat = Some(7);
        store.insert(overdue_one_shot.clone()).unwrap();
        store.insert(current_weekly.clone()).unwrap();

        assert_eq!(renovate(&store).unwrap(), 0);
        assert_eq!(
            store.get_by_id(overdue_one_shot.id, None).unwrap().complete_date,
            overdue_one_shot.complete_date
        );
        assert_eq!(
            store.get_by_id(current_weekly.id, None).unwrap().complete_date,
            current_weekly.complete_date
        );
    }
}
