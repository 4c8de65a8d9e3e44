//! Subtitle timestamp formatting.

/// Split seconds into whole hours, minutes, seconds and milliseconds.
fn split_millis(total_secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (total_secs.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total = total_ms / 1000;
    (total / 3600, (total % 3600) / 60, total % 60, ms)
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// # Examples
/// ```
/// use studycast_models::timestamp::format_srt_timestamp;
/// assert_eq!(format_srt_timestamp(2.5), "00:00:02,500");
/// assert_eq!(format_srt_timestamp(3725.042), "01:02:05,042");
/// ```
pub fn format_srt_timestamp(total_secs: f64) -> String {
    let (h, m, s, ms) = split_millis(total_secs);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Format seconds as an ASS timestamp (`H:MM:SS.cc`, centiseconds).
pub fn format_ass_timestamp(total_secs: f64) -> String {
    let total_cs = (total_secs.max(0.0) * 100.0).round() as u64;
    let cs = total_cs % 100;
    let total = total_cs / 100;
    format!(
        "{}:{:02}:{:02}.{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60,
        cs
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(59.9999), "00:01:00,000");
        assert_eq!(format_srt_timestamp(-1.0), "00:00:00,000");
    }

    #[test]
    fn test_ass_timestamp() {
        assert_eq!(format_ass_timestamp(2.5), "0:00:02.50");
        assert_eq!(format_ass_timestamp(3661.07), "1:01:01.07");
    }
}
