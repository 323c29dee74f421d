use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta, Utc};

/// Accepted formats for a wall-clock time of day.
const TIME_OF_DAY_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    TIME_OF_DAY_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value.trim(), format).ok())
}

/// Places `time` on the local date of `now` and converts the result to UTC.
pub fn local_time_today(
    now: DateTime<Utc>,
    offset: FixedOffset,
    time: NaiveTime,
) -> Option<DateTime<Utc>> {
    now.with_timezone(&offset)
        .date_naive()
        .and_time(time)
        .and_local_timezone(offset)
        .single()
        .map(|v| v.to_utc())
}

/// Whole seconds in a duration. The fractional part is dropped.
pub fn whole_seconds(duration: TimeDelta) -> i64 {
    duration.num_seconds()
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveTime, TimeDelta, TimeZone, Utc};

    use super::{local_time_today, parse_time_of_day, whole_seconds};

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(
            parse_time_of_day("09:30"),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert_eq!(
            parse_time_of_day("17:05:42"),
            NaiveTime::from_hms_opt(17, 5, 42)
        );
        assert_eq!(parse_time_of_day("25:00"), None);
        assert_eq!(parse_time_of_day("noon"), None);
        assert_eq!(parse_time_of_day(""), None);
    }

    #[test]
    fn test_local_time_today_uses_local_date() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        // 02:00 UTC on the 15th is still the 14th at -05:00.
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 2, 0, 0).unwrap();
        let converted =
            local_time_today(now, offset, NaiveTime::from_hms_opt(9, 0, 0).unwrap()).unwrap();
        assert_eq!(converted, Utc.with_ymd_and_hms(2024, 3, 14, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_whole_seconds_truncates() {
        assert_eq!(whole_seconds(TimeDelta::milliseconds(5999)), 5);
        assert_eq!(whole_seconds(TimeDelta::hours(25)), 90000);
    }
}
