//! Display helpers for costs and durations.

/// Cost in USD with four decimals, e.g. `$0.1234`. Unknown cost is `$0.0000`.
pub fn format_cost(cost: Option<f64>) -> String {
    format!("${:.4}", cost.unwrap_or(0.0))
}

/// Duration in seconds as `MM:SS`. Unknown duration is `00:00`.
pub fn format_duration(seconds: Option<f64>) -> String {
    let total = seconds.filter(|s| s.is_finite()).unwrap_or(0.0).max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Whole seconds elapsed between `start_millis` and `now_millis`, e.g. `5s`.
///
/// Clamped at zero; `None` when there is no start time.
pub fn format_elapsed(start_millis: Option<i64>, now_millis: i64) -> Option<String> {
    let start = start_millis?;
    let elapsed = (now_millis - start).max(0) / 1000;
    Some(format!("{elapsed}s"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_has_four_decimals() {
        assert_eq!(format_cost(Some(0.15)), "$0.1500");
        assert_eq!(format_cost(Some(1.23456)), "$1.2346");
        assert_eq!(format_cost(None), "$0.0000");
    }

    #[test]
    fn duration_is_minutes_and_seconds() {
        assert_eq!(format_duration(Some(90.0)), "01:30");
        assert_eq!(format_duration(Some(5.9)), "00:05");
        assert_eq!(format_duration(Some(3600.0)), "60:00");
        assert_eq!(format_duration(None), "00:00");
    }

    #[test]
    fn elapsed_is_clamped() {
        assert_eq!(format_elapsed(Some(1_000), 6_500).as_deref(), Some("5s"));
        assert_eq!(format_elapsed(Some(10_000), 5_000).as_deref(), Some("0s"));
        assert_eq!(format_elapsed(None, 5_000), None);
    }
}
