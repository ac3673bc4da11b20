//! Pure display helpers for countdown values

use std::time::Duration;

/// Format remaining seconds as `M:SS`
///
/// Absent, zero and negative values all render as `0:00`.
pub fn format_time(seconds: Option<i64>) -> String {
    match seconds {
        Some(s) if s > 0 => format!("{}:{:02}", s / 60, s % 60),
        _ => "0:00".to_string(),
    }
}

/// Percentage of `total` still remaining, clamped to `[0, 100]`
pub fn progress_percent(seconds: Option<i64>, total: u64) -> f64 {
    let Some(seconds) = seconds else {
        return 0.0;
    };
    if total == 0 || seconds <= 0 {
        return 0.0;
    }

    (seconds as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Format an elapsed duration as a short human readable string
pub fn format_uptime(duration: Duration) -> String {
    let hours = duration.as_secs() / 3600;
    let minutes = (duration.as_secs() % 3600) / 60;
    let seconds = duration.as_secs() % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_time(Some(180)), "3:00");
        assert_eq!(format_time(Some(65)), "1:05");
        assert_eq!(format_time(Some(9)), "0:09");
        assert_eq!(format_time(Some(3600)), "60:00");
    }

    #[test]
    fn out_of_domain_values_format_as_zero() {
        assert_eq!(format_time(Some(0)), "0:00");
        assert_eq!(format_time(None), "0:00");
        assert_eq!(format_time(Some(-5)), "0:00");
    }

    #[test]
    fn progress_relative_to_total() {
        assert_eq!(progress_percent(Some(180), 180), 100.0);
        assert_eq!(progress_percent(Some(90), 180), 50.0);
        assert_eq!(progress_percent(Some(0), 180), 0.0);
    }

    #[test]
    fn progress_clamps_and_degrades_to_zero() {
        assert_eq!(progress_percent(None, 180), 0.0);
        assert_eq!(progress_percent(Some(60), 0), 0.0);
        assert_eq!(progress_percent(Some(-30), 180), 0.0);
        assert_eq!(progress_percent(Some(500), 180), 100.0);
    }

    #[test]
    fn uptime_picks_largest_unit() {
        assert_eq!(format_uptime(Duration::from_secs(42)), "42s");
        assert_eq!(format_uptime(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_uptime(Duration::from_secs(3725)), "1h 2m 5s");
    }
}
