//! Calendar helpers. Instants are stored UTC; "today" and "midnight" follow
//! the machine's local timezone, because that is the calendar the user plans
//! against.

use chrono::{DateTime, Duration, Local, Utc};

pub fn is_today(date: DateTime<Utc>) -> bool {
    date.with_timezone(&Local).date_naive() == Local::now().date_naive()
}

pub fn is_tomorrow(date: DateTime<Utc>) -> bool {
    date.with_timezone(&Local).date_naive() == Local::now().date_naive() + Duration::days(1)
}

/// Strictly in the future.
pub fn is_scheduled(date: DateTime<Utc>) -> bool {
    date > Utc::now()
}

/// Falls on today's local date and has not passed yet — the refill
/// eligibility window.
pub fn is_today_scheduled(date: DateTime<Utc>) -> bool {
    is_today(date) && is_scheduled(date)
}

/// Whole local days between `date`'s calendar day and today; positive when
/// the date is in the past.
pub fn days_overdue(date: DateTime<Utc>) -> i64 {
    (Local::now().date_naive() - date.with_timezone(&Local).date_naive()).num_days()
}

/// The next local midnight, as a UTC instant. On DST transitions where
/// midnight is skipped or doubled, the earliest valid interpretation wins.
pub fn next_local_midnight() -> DateTime<Utc> {
    let tomorrow = Local::now().date_naive() + Duration::days(1);
    tomorrow
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|local| local.with_timezone(&Utc))
        // Unreachable for real timezones; fall back to a plain 24h hop.
        .unwrap_or_else(|| Utc::now() + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_today_but_not_scheduled_forever() {
        let in_a_minute = Utc::now() + Duration::minutes(1);
        assert!(is_today(in_a_minute));
        assert!(is_scheduled(in_a_minute));
        assert!(is_today_scheduled(in_a_minute));
    }

    #[test]
    fn past_instant_is_not_scheduled() {
        let earlier = Utc::now() - Duration::minutes(5);
        assert!(!is_scheduled(earlier));
        assert!(!is_today_scheduled(earlier));
    }

    #[test]
    fn far_future_is_not_today() {
        let next_week = Utc::now() + Duration::days(7);
        assert!(!is_today(next_week));
        assert!(!is_today_scheduled(next_week));
    }

    #[test]
    fn next_midnight_is_tomorrow_local() {
        let midnight = next_local_midnight();
        assert!(midnight > Utc::now());
        assert!(is_tomorrow(midnight));
    }

    #[test]
    fn overdue_counts_whole_days() {
        assert_eq!(days_overdue(Utc::now()), 0);
        let two_weeks_ago = Utc::now() - Duration::days(14);
        assert_eq!(days_overdue(two_weeks_ago), 14);
    }
}
