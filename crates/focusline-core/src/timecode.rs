/// Format a microsecond timestamp as `MM:SS.ffffff`.
///
/// Minutes are zero-padded to at least two digits and keep growing past 99;
/// seconds are exactly two digits, microseconds exactly six. Negative input
/// clamps to the zero case.
pub fn format_timestamp(timestamp_us: i64) -> String {
    let us = timestamp_us.max(0) as u64;
    let micros = us % 1_000_000;
    let total_seconds = us / 1_000_000;
    let seconds = total_seconds % 60;
    let minutes = total_seconds / 60;
    format!("{minutes:02}:{seconds:02}.{micros:06}")
}
