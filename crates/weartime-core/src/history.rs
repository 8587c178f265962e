//! Totals and listings derived from the session log.
//!
//! Only complete sessions count toward totals; interrupted records carry a
//! detection time rather than a real end and would inflate them. A session
//! that spans midnight is split between the local dates it overlaps.

use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::Clock;
use crate::models::SessionRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_ms: u64,
    /// Sessions that overlap this date
    pub sessions: usize,
}

/// Wear time logged on the local date `date`
pub fn today_total(records: &[SessionRecord], clock: &dyn Clock, date: NaiveDate) -> u64 {
    daily_total(records, clock, date).total_ms
}

pub fn daily_total(records: &[SessionRecord], clock: &dyn Clock, date: NaiveDate) -> DailyTotal {
    let mut total = DailyTotal {
        date,
        total_ms: 0,
        sessions: 0,
    };

    for record in records.iter().filter(|r| r.is_complete) {
        let overlap = record.overlap_ms(date, clock);
        if overlap > 0 {
            total.total_ms += overlap;
            total.sessions += 1;
        }
    }

    total
}

/// The seven days ending at `end_date`, oldest first
pub fn weekly(records: &[SessionRecord], clock: &dyn Clock, end_date: NaiveDate) -> Vec<DailyTotal> {
    (0..7)
        .rev()
        .filter_map(|days_back| end_date.checked_sub_days(chrono::Days::new(days_back)))
        .map(|date| daily_total(records, clock, date))
        .collect()
}

/// Most recent sessions first
pub fn recent(records: &[SessionRecord], limit: usize) -> Vec<&SessionRecord> {
    let mut sorted: Vec<&SessionRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.end_time.cmp(&a.end_time).then(b.id.cmp(&a.id)));
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, FixedOffset};

    fn clock() -> ManualClock {
        ManualClock::at_local(
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            12,
            0,
            FixedOffset::east_opt(0).unwrap(),
        )
    }

    fn session(clock: &ManualClock, hours_ago: i64, minutes: i64) -> SessionRecord {
        let end = clock.now() - Duration::hours(hours_ago);
        SessionRecord::completed(end - Duration::minutes(minutes), end, Duration::hours(24), clock)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_today_total_ignores_other_days_and_interrupted() {
        let clock = clock();
        let mut interrupted = session(&clock, 1, 45);
        interrupted.is_complete = false;
        interrupted.interrupted = true;

        let records = vec![
            session(&clock, 2, 30),  // today 09:30-10:00
            session(&clock, 1, 15),  // today 10:45-11:00
            session(&clock, 30, 60), // yesterday
            interrupted,
        ];

        assert_eq!(today_total(&records, &clock, day(3)), 45 * 60 * 1000);
        assert_eq!(today_total(&records, &clock, day(2)), 60 * 60 * 1000);
    }

    #[test]
    fn test_weekly_splits_midnight_sessions() {
        let clock = clock();
        // 11:00 on Jan 2 back to 22:00 on Jan 1
        let records = vec![session(&clock, 25, 13 * 60)];
        let week = weekly(&records, &clock, day(3));

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, NaiveDate::from_ymd_opt(2023, 12, 28).unwrap());
        assert_eq!(week[6].date, day(3));

        assert_eq!(week[4].date, day(1));
        assert_eq!(week[4].total_ms, 2 * 3_600_000);
        assert_eq!(week[5].total_ms, 11 * 3_600_000);
        assert_eq!(week[5].sessions, 1);
        assert_eq!(week[6].total_ms, 0);
    }

    #[test]
    fn test_recent_newest_first() {
        let clock = clock();
        let records = vec![
            session(&clock, 5, 10),
            session(&clock, 1, 10),
            session(&clock, 3, 10),
        ];

        let latest = recent(&records, 2);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0], &records[1]);
        assert_eq!(latest[1], &records[2]);
    }
}
