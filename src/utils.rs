//! Display helpers for listing rows.

use chrono::{DateTime, Local, Utc};

/// Formats a timestamp as local `YYYY-MM-DD HH:mm:ss`, or "N/A" when absent.
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(date) => date.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "N/A".to_string(),
    }
}

/// Format a file size for display (human-readable)
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if size >= TB {
        format!("{:.1} TB", size as f64 / TB as f64)
    } else if size >= GB {
        format!("{:.1} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1} KB", size as f64 / KB as f64)
    } else {
        format!("{size} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn expected_local(date: DateTime<Utc>) -> String {
        let local = date.with_timezone(&Local);
        format!(
            "{}-{:02}-{:02} {:02}:{:02}:{:02}",
            local.year(),
            local.month(),
            local.day(),
            local.hour(),
            local.minute(),
            local.second()
        )
    }

    #[test]
    fn test_format_date_none() {
        assert_eq!(format_date(None), "N/A");
    }

    #[test]
    fn test_format_date_local_wall_clock() {
        // Built from a local wall-clock time so the result is zone-independent
        let local = Local.with_ymd_and_hms(2024, 3, 5, 8, 7, 3).unwrap();
        assert_eq!(format_date(Some(local.with_timezone(&Utc))), "2024-03-05 08:07:03");
    }

    #[test]
    fn test_format_date_epoch_and_year_end() {
        for date in [
            Utc.timestamp_opt(0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 12, 31, 23, 59, 59).unwrap(),
        ] {
            assert_eq!(format_date(Some(date)), expected_local(date));
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
