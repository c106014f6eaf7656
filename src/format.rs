//! Display formatting for amounts and dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a `YYYY-MM-DD` date or an RFC 3339 timestamp.
pub fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt: NaiveDateTime| dt.and_utc())
}

/// "Jan 5, 2026"; unparseable input is returned unchanged.
pub fn format_date(value: &str) -> String {
    match parse_date_time(value) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => value.to_string(),
    }
}

/// "Jan 5, 2026 at 12:30 PM"; unparseable input is returned unchanged.
pub fn format_date_time(value: &str) -> String {
    match parse_date_time(value) {
        Some(dt) => dt.format("%b %-d, %Y at %-I:%M %p").to_string(),
        None => value.to_string(),
    }
}

/// "CHF 15,000" (two decimals only when the amount has a fractional part).
pub fn format_chf(value: f64) -> String {
    let negative = value < 0.0;
    let abs = value.abs();
    let cents = (abs * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let frac = cents % 100;
    let sign = if negative { "-" } else { "" };
    if frac == 0 {
        format!("CHF {}{}", sign, whole)
    } else {
        format!("CHF {}{}.{:02}", sign, whole, frac)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Distance between `value` and `now` in words with an "in"/"ago" suffix,
/// e.g. "in about 2 months" or "3 days ago".
pub fn relative_date(value: &str, now: DateTime<Utc>) -> String {
    let Some(dt) = parse_date_time(value) else {
        return value.to_string();
    };
    let seconds = (dt - now).num_seconds();
    let words = distance_in_words(seconds.unsigned_abs());
    if seconds >= 0 {
        format!("in {}", words)
    } else {
        format!("{} ago", words)
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

fn distance_in_words(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let minutes = (seconds + MINUTE / 2) / MINUTE;
    match seconds {
        s if s < 30 => "less than a minute".to_string(),
        s if s < 45 * MINUTE => plural(minutes.max(1), "minute"),
        s if s < 90 * MINUTE => "about 1 hour".to_string(),
        s if s < DAY => format!("about {} hours", (s + HOUR / 2) / HOUR),
        s if s < 42 * HOUR => "1 day".to_string(),
        s if s < MONTH => plural((s + DAY / 2) / DAY, "day"),
        s if s < 45 * DAY => "about 1 month".to_string(),
        s if s < 60 * DAY => "about 2 months".to_string(),
        s if s < YEAR => plural((s + MONTH / 2) / MONTH, "month"),
        s => {
            let years = s / YEAR;
            let rest = s % YEAR;
            if rest < 3 * MONTH {
                format!("about {}", plural(years, "year"))
            } else if rest < 9 * MONTH {
                format!("over {}", plural(years, "year"))
            } else {
                format!("almost {}", plural(years + 1, "year"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-01-05"), "Jan 5, 2026");
        assert_eq!(format_date("2026-11-23T08:00:00.000Z"), "Nov 23, 2026");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn test_format_date_time() {
        assert_eq!(
            format_date_time("2026-01-05T12:30:00.000Z"),
            "Jan 5, 2026 at 12:30 PM"
        );
        assert_eq!(
            format_date_time("2026-01-05T00:05:00Z"),
            "Jan 5, 2026 at 12:05 AM"
        );
    }

    #[test]
    fn test_format_chf() {
        assert_eq!(format_chf(0.0), "CHF 0");
        assert_eq!(format_chf(15000.0), "CHF 15,000");
        assert_eq!(format_chf(1234567.5), "CHF 1,234,567.50");
        assert_eq!(format_chf(999.0), "CHF 999");
    }

    #[test]
    fn test_relative_date() {
        assert_eq!(relative_date("2026-01-08T12:30:00Z", now()), "in 3 days");
        assert_eq!(relative_date("2026-01-01T12:30:00Z", now()), "4 days ago");
        assert_eq!(relative_date("2026-04-05", now()), "in 3 months");
        assert_eq!(relative_date("2026-01-05T12:30:10Z", now()), "in less than a minute");
        assert_eq!(relative_date("2027-01-20", now()), "in about 1 year");
        assert_eq!(relative_date("garbage", now()), "garbage");
    }
}
