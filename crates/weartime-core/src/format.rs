//! Display formatting helpers

/// Format milliseconds as `HH:MM:SS`. Hours are not capped at 24.
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Duration in hours rounded to 2 decimal places
pub fn duration_hours(ms: u64) -> f64 {
    (ms as f64 / 3_600_000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(999), "00:00:00");
        assert_eq!(format_duration(3_665_000), "01:01:05");
        assert_eq!(format_duration(90 * 60 * 1000), "01:30:00");
        assert_eq!(format_duration(100 * 3_600_000), "100:00:00");
    }

    #[test]
    fn test_duration_hours() {
        assert_eq!(duration_hours(3_665_000), 1.02);
        assert_eq!(duration_hours(0), 0.0);
    }
}
