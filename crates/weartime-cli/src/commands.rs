//! Text rendering for the command-line views

use chrono::TimeZone;
use std::fmt::{Display, Write};

use weartime_core::{
    format::{duration_hours, format_duration},
    history::DailyTotal,
    models::SessionRecord,
};

use crate::timer::{TimerSnapshot, Toggled};

/// One-line display: counter plus status message
pub fn status_line(total_ms: u64, status: impl Display) -> String {
    format!("{}  {}", format_duration(total_ms), status)
}

pub fn render_status(snapshot: &TimerSnapshot) -> String {
    let mut out = status_line(snapshot.total_ms, &snapshot.status_text);
    if snapshot.state.is_running {
        let _ = write!(out, "\nCurrent session: {}", format_duration(snapshot.session_ms));
    }
    if let Some(warning) = &snapshot.warning {
        let _ = write!(out, "\nWarning: {}", warning);
    }
    out
}

pub fn render_toggled<Tz>(toggled: &Toggled, total_ms: u64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match toggled {
        Toggled::Started(at) => format!("Started at {}", at.with_timezone(tz).format("%H:%M:%S")),
        Toggled::Stopped(record) => format!(
            "Stopped after {} - Total today: {}",
            record.duration_formatted(),
            format_duration(total_ms)
        ),
    }
}

/// Session list, one record per line
pub fn render_history<Tz>(records: &[&SessionRecord], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if records.is_empty() {
        return "No sessions recorded".to_string();
    }

    let mut out = String::new();
    for record in records {
        let start = record.start_time.with_timezone(tz);
        let end = record.end_time.with_timezone(tz);
        let _ = write!(
            out,
            "{}  {} - {}  {}",
            start.format("%Y-%m-%d"),
            start.format("%H:%M"),
            end.format("%H:%M"),
            record.duration_formatted()
        );

        let flags = record_flags(record);
        if !flags.is_empty() {
            let _ = write!(out, "  [{}]", flags.join(", "));
        }
        out.push('\n');
    }
    out.pop();
    out
}

pub fn render_week(totals: &[DailyTotal]) -> String {
    let mut out = String::new();
    let mut week_ms = 0;

    for day in totals {
        week_ms += day.total_ms;
        let _ = writeln!(
            out,
            "{}  {}  {:>5.2}h  {} session(s)",
            day.date.format("%a %Y-%m-%d"),
            format_duration(day.total_ms),
            duration_hours(day.total_ms),
            day.sessions
        );
    }

    let _ = write!(out, "Total           {}  {:>5.2}h", format_duration(week_ms), duration_hours(week_ms));
    out
}

fn record_flags(record: &SessionRecord) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if record.interrupted {
        flags.push("interrupted");
    }
    if record.crosses_midnight {
        flags.push("crosses midnight");
    }
    if record.long_duration {
        flags.push("long");
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, NaiveDate, Utc};
    use weartime_core::{ManualClock, models::Status, models::TimerState};

    fn record(end_secs: i64, length_secs: i64) -> SessionRecord {
        let clock = ManualClock::new(DateTime::from_timestamp(end_secs, 0).unwrap());
        let end = DateTime::from_timestamp(end_secs, 0).unwrap();
        SessionRecord::completed(end - Duration::seconds(length_secs), end, Duration::hours(24), &clock)
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(3_665_000, Status::Running), "01:01:05  Timer running...");
    }

    #[test]
    fn test_render_status_running_with_warning() {
        let mut state = TimerState::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        state.begin(Utc::now());
        let snapshot = TimerSnapshot {
            state,
            status: Status::Running,
            status_text: Status::Running.to_string(),
            total_ms: 5000,
            session_ms: 2000,
            warning: Some("disk full".to_string()),
        };

        assert_eq!(
            render_status(&snapshot),
            "00:00:05  Timer running...\nCurrent session: 00:00:02\nWarning: disk full"
        );
    }

    #[test]
    fn test_render_history() {
        // 2024-01-01 12:00:00 UTC
        let first = record(1_704_110_400, 3600);
        let mut second = record(1_704_114_000, 600);
        second.interrupted = true;
        second.is_complete = false;

        let text = render_history(&[&second, &first], &Utc);
        assert_eq!(
            text,
            "2024-01-01  12:50 - 13:00  00:10:00  [interrupted]\n2024-01-01  11:00 - 12:00  01:00:00"
        );
        assert_eq!(render_history(&[], &Utc), "No sessions recorded");
    }

    #[test]
    fn test_render_toggled() {
        let started = Toggled::Started(DateTime::from_timestamp(1_704_110_400, 0).unwrap());
        assert_eq!(render_toggled(&started, 0, &Utc), "Started at 12:00:00");

        let stopped = Toggled::Stopped(record(1_704_110_400, 90));
        assert_eq!(
            render_toggled(&stopped, 120_000, &Utc),
            "Stopped after 00:01:30 - Total today: 00:02:00"
        );
    }

    #[test]
    fn test_render_week_total() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let totals = vec![DailyTotal {
            date,
            total_ms: 5_400_000,
            sessions: 2,
        }];

        let text = render_week(&totals);
        assert!(text.starts_with("Mon 2024-01-01  01:30:00   1.50h  2 session(s)"));
        assert!(text.ends_with("01:30:00   1.50h"));
    }
}
