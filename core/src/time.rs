/// Format a position in seconds as zero-padded `MM:SS`.
///
/// There is no hour component: minutes keep counting past 59, so a two-hour
/// video ends at `120:00`. Negative and non-finite input renders as `00:00`.
pub fn format_time(seconds: f64) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total_seconds = seconds.floor() as u64;
    let minutes = total_seconds / 60;
    let remainder = total_seconds % 60;

    format!("{:02}:{:02}", minutes, remainder)
}

/// Format the elapsed/duration label shown under the seek bar
pub fn format_progress(current: f64, duration: f64) -> String {
    format!("{} / {}", format_time(current), format_time(duration))
}
