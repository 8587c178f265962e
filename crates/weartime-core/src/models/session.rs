//! Completed session records

use crate::clock::Clock;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One start-to-stop interval, appended to the log when the session ends.
///
/// Timestamps are stored as epoch milliseconds, matching the persisted log
/// format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Creation timestamp in epoch milliseconds
    #[serde(default)]
    pub id: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    /// Milliseconds between start and end
    #[serde(alias = "sessionTime")]
    pub session_duration: u64,
    /// False when the record was synthesized during crash recovery
    #[serde(default = "default_true")]
    pub is_complete: bool,
    #[serde(default)]
    pub long_duration: bool,
    #[serde(default)]
    pub crosses_midnight: bool,
    #[serde(default)]
    pub interrupted: bool,
}

fn default_true() -> bool {
    true
}

impl SessionRecord {
    /// Record for a session the user stopped normally
    pub fn completed(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        long_session: Duration,
        clock: &dyn Clock,
    ) -> Self {
        Self::build(start_time, end_time, long_session, clock, true)
    }

    /// Record for a running session discarded during recovery; `end_time` is
    /// when the loss was detected, not when wear actually ended
    pub fn interrupted(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        long_session: Duration,
        clock: &dyn Clock,
    ) -> Self {
        Self::build(start_time, end_time, long_session, clock, false)
    }

    fn build(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        long_session: Duration,
        clock: &dyn Clock,
        is_complete: bool,
    ) -> Self {
        let end_time = end_time.max(start_time);
        let duration = end_time - start_time;

        Self {
            id: clock.now().timestamp_millis(),
            start_time,
            end_time,
            session_duration: duration.num_milliseconds().max(0) as u64,
            is_complete,
            long_duration: duration > long_session,
            crosses_midnight: clock.local_date(start_time) != clock.local_date(end_time),
            interrupted: !is_complete,
        }
    }

    /// Fill in fields missing from older log entries and reject entries that
    /// cannot be trusted
    pub(crate) fn normalize(mut self) -> Option<Self> {
        if self.end_time < self.start_time {
            return None;
        }

        if self.id == 0 {
            self.id = self.end_time.timestamp_millis();
        }

        let actual = (self.end_time - self.start_time).num_milliseconds().max(0) as u64;
        if self.session_duration != actual {
            tracing::debug!(
                "Record {} duration {} disagrees with timestamps, using {}",
                self.id,
                self.session_duration,
                actual
            );
            self.session_duration = actual;
        }

        Some(self)
    }

    pub fn duration(&self) -> Duration {
        Duration::milliseconds(self.session_duration as i64)
    }

    /// Milliseconds of this session falling on the local date `date`
    pub fn overlap_ms(&self, date: NaiveDate, clock: &dyn Clock) -> u64 {
        let day_start = clock.start_of_day(date);
        let day_end = date
            .succ_opt()
            .map(|next| clock.start_of_day(next))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let from = self.start_time.max(day_start);
        let to = self.end_time.min(day_end);
        if to <= from {
            return 0;
        }
        (to - from).num_milliseconds() as u64
    }

    /// Get the duration as a formatted string (HH:MM:SS)
    pub fn duration_formatted(&self) -> String {
        crate::format::format_duration(self.session_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::FixedOffset;

    fn clock_at(hour: u32, minute: u32) -> ManualClock {
        ManualClock::at_local(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            hour,
            minute,
            FixedOffset::east_opt(3600).unwrap(),
        )
    }

    #[test]
    fn test_completed_record() {
        let clock = clock_at(12, 0);
        let start = clock.now() - Duration::minutes(90);
        let record = SessionRecord::completed(start, clock.now(), Duration::hours(24), &clock);

        assert_eq!(record.session_duration, 90 * 60 * 1000);
        assert_eq!(record.id, clock.now().timestamp_millis());
        assert!(record.is_complete);
        assert!(!record.interrupted);
        assert!(!record.long_duration);
        assert!(!record.crosses_midnight);
        assert_eq!(record.duration_formatted(), "01:30:00");
    }

    #[test]
    fn test_flags() {
        let clock = clock_at(0, 30);
        let start = clock.now() - Duration::hours(25);
        let record = SessionRecord::interrupted(start, clock.now(), Duration::hours(24), &clock);

        assert!(!record.is_complete);
        assert!(record.interrupted);
        assert!(record.long_duration);
        assert!(record.crosses_midnight);
    }

    #[test]
    fn test_end_before_start_clamps_to_zero() {
        let clock = clock_at(12, 0);
        let start = clock.now() + Duration::seconds(10);
        let record = SessionRecord::completed(start, clock.now(), Duration::hours(24), &clock);
        assert_eq!(record.session_duration, 0);
    }

    #[test]
    fn test_legacy_record_deserializes() {
        let json = r#"{"sessionTime":5000,"startTime":1704106800000,"endTime":1704106805000}"#;
        let record: SessionRecord = serde_json::from_str(json).unwrap();
        let record = record.normalize().unwrap();

        assert_eq!(record.session_duration, 5000);
        assert_eq!(record.id, 1704106805000);
        assert!(record.is_complete);
        assert!(!record.interrupted);
    }

    #[test]
    fn test_serializes_camel_case_millis() {
        let clock = clock_at(12, 0);
        let start = clock.now() - Duration::seconds(5);
        let record = SessionRecord::completed(start, clock.now(), Duration::hours(24), &clock);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["sessionDuration"], 5000);
        assert_eq!(value["startTime"], start.timestamp_millis());
        assert_eq!(value["crossesMidnight"], false);
    }

    #[test]
    fn test_overlap_splits_at_local_midnight() {
        let clock = clock_at(1, 0);
        let start = clock.now() - Duration::hours(3); // 22:00 the previous day
        let record = SessionRecord::completed(start, clock.now(), Duration::hours(24), &clock);

        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dec31 = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(record.overlap_ms(jan1, &clock), 3_600_000);
        assert_eq!(record.overlap_ms(dec31, &clock), 2 * 3_600_000);
    }
}
