use chrono::{NaiveDate, NaiveDateTime};

/// Parse an ISO-8601 calendar date, tolerating a trailing time component
/// (`YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD HH:MM:SS`).
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    const ISO_TS: &str = "%Y-%m-%dT%H:%M:%S";
    const SPACE_TS: &str = "%Y-%m-%d %H:%M:%S";
    NaiveDateTime::parse_from_str(s, ISO_TS)
        .or_else(|_| NaiveDateTime::parse_from_str(s, SPACE_TS))
        .ok()
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_timestamped_dates() {
        let want = NaiveDate::from_ymd_opt(2021, 6, 1);
        assert_eq!(parse_iso_date("2021-06-01"), want);
        assert_eq!(parse_iso_date(" 2021-06-01 "), want);
        assert_eq!(parse_iso_date("2021-06-01T00:00:00"), want);
        assert_eq!(parse_iso_date("2021-06-01 13:45:00"), want);
    }

    #[test]
    fn rejects_other_formats() {
        assert_eq!(parse_iso_date("2021/06/01"), None);
        assert_eq!(parse_iso_date("2021-13-01"), None);
        assert_eq!(parse_iso_date(""), None);
    }
}
