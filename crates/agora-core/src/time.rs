use chrono::{DateTime, Utc};

/// Canonical wire timestamp format: "%d.%m.%Y, %H:%M:%S", always UTC.
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_dots_and_comma() {
        let dt = Utc.with_ymd_and_hms(2026, 8, 1, 13, 5, 9).unwrap();
        assert_eq!(format_timestamp(dt), "01.08.2026, 13:05:09");
    }
}
