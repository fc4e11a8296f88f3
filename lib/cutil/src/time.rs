//! Time formatting helpers for log lines and batch summaries.

use chrono::Local;
use std::time::Duration;

/// Formats the current local time according to the specified format string.
///
/// The format string follows the same syntax as `chrono::format::strftime`.
///
/// # Examples
///
/// ```
/// use cutil::time::local_now;
///
/// let formatted = local_now("%H:%M:%S");
/// assert_eq!(formatted.len(), 8);
/// ```
pub fn local_now(format: &str) -> String {
    Local::now().format(format).to_string()
}

/// Formats an elapsed duration as `MM:SS.mmm`, or `HH:MM:SS.mmm` once it
/// reaches an hour.
///
/// # Examples
///
/// ```
/// use cutil::time::elapsed_str;
/// use std::time::Duration;
///
/// assert_eq!(elapsed_str(Duration::from_millis(123_456)), "02:03.456");
/// assert_eq!(elapsed_str(Duration::from_millis(3_661_789)), "01:01:01.789");
/// ```
pub fn elapsed_str(elapsed: Duration) -> String {
    let total_seconds = elapsed.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    let ms = elapsed.subsec_millis();

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, ms)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, secs, ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_now() {
        let ts = local_now("%H:%M:%S");
        assert_eq!(ts.len(), 8);
        assert_eq!(ts.matches(':').count(), 2);
    }

    #[test]
    fn test_elapsed_str() {
        assert_eq!(elapsed_str(Duration::ZERO), "00:00.000");
        assert_eq!(elapsed_str(Duration::from_millis(999)), "00:00.999");
        assert_eq!(elapsed_str(Duration::from_secs(59)), "00:59.000");
        assert_eq!(elapsed_str(Duration::from_secs(3600)), "01:00:00.000");
    }
}
