use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime};
use chrono_english::{parse_date_string, Dialect};

/// This is the standard way of formatting a record timestamp in punchcard.
pub const RECORD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_record_time(time: DateTime<Local>) -> String {
    time.format(RECORD_TIME_FORMAT).to_string()
}

pub fn parse_record_time(value: &str) -> Option<DateTime<Local>> {
    NaiveDateTime::parse_from_str(value, RECORD_TIME_FORMAT)
        .ok()?
        .and_local_timezone(Local)
        .earliest()
}

/// Renders a number of seconds as a zero-padded `HH:MM:SS` clock string.
pub fn format_clock(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60
    )
}

/// Earliest instant the stores care about. Commands that want the whole
/// history pass this as their window start.
pub fn epoch_start() -> DateTime<Local> {
    DateTime::UNIX_EPOCH.with_timezone(&Local)
}

/// Parses a due date from user input. Accepts a literal `%Y-%m-%d` date,
/// a relative `+Ndays` offset, or an english phrase like "today", "tomorrow"
/// or "next friday".
pub fn parse_due_date(input: &str, now: DateTime<Local>) -> Result<NaiveDate> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Some(rest) = input.strip_prefix('+') {
        let days = rest.trim_end_matches("days").trim_end_matches("day").trim();
        let days = days
            .parse::<i64>()
            .map_err(|_| anyhow!("can't parse {input} as a +Ndays offset"))?;
        return Ok((now + Duration::days(days)).date_naive());
    }
    let parsed = parse_date_string(input, now, Dialect::Uk)
        .map_err(|e| anyhow!("can't parse {input} as a date: {e}"))?;
    Ok(parsed.date_naive())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(59), "00:00:59");
        assert_eq!(format_clock(3600 + 2 * 60 + 3), "01:02:03");
        assert_eq!(format_clock(100 * 3600), "100:00:00");
        assert_eq!(format_clock(-5), "00:00:00");
    }

    #[test]
    fn test_record_time_round_trip() {
        let time = fixed_now();
        assert_eq!(parse_record_time(&format_record_time(time)), Some(time));
        assert_eq!(parse_record_time("not a date"), None);
    }

    #[test]
    fn test_due_date_literal() {
        assert_eq!(
            parse_due_date("2025-04-01", fixed_now()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
        );
    }

    #[test]
    fn test_due_date_offset() {
        assert_eq!(
            parse_due_date("+5days", fixed_now()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
        assert_eq!(
            parse_due_date("+1day", fixed_now()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()
        );
        assert!(parse_due_date("+soon", fixed_now()).is_err());
    }

    #[test]
    fn test_due_date_phrases() {
        assert_eq!(
            parse_due_date("today", fixed_now()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert_eq!(
            parse_due_date("tomorrow", fixed_now()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()
        );
    }
}
