/// Format seconds as `m:ss`. Unknown (NaN, infinite) and negative values
/// render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Remaining time, or NaN while the duration is unknown.
pub fn remaining(elapsed: f64, duration: f64) -> f64 {
    if duration.is_finite() {
        (duration - elapsed).max(0.0)
    } else {
        f64::NAN
    }
}
