use chrono::{DateTime, Datelike, FixedOffset, TimeDelta, Utc};
use now::DateTimeNow;

/// Lower bounds a report can be restricted to. Only one can be used at a time, no window means
/// all recorded work counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Today,
    /// Since the most recent Monday.
    Week,
    Month,
    Days(u32),
    Weeks(u32),
}

/// Computes window boundaries for the local day that contains `now`.
/// All results are UTC instants.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindows {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl TimeWindows {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    fn local_now(&self) -> DateTime<FixedOffset> {
        self.now.with_timezone(&self.offset)
    }

    /// Local midnight of the current day.
    pub fn start_of_today(&self) -> DateTime<Utc> {
        self.local_now().beginning_of_day().to_utc()
    }

    /// Local midnight of the most recent Monday, today included.
    pub fn start_of_week(&self) -> DateTime<Utc> {
        let weekday = self.local_now().weekday().num_days_from_monday();
        self.days_ago(weekday)
    }

    /// Local midnight of the first day of the current month.
    pub fn start_of_month(&self) -> DateTime<Utc> {
        let day = self.local_now().day();
        self.days_ago(day - 1)
    }

    pub fn days_ago(&self, days: u32) -> DateTime<Utc> {
        subtract(self.start_of_today(), TimeDelta::days(days.into()))
    }

    pub fn weeks_ago(&self, weeks: u32) -> DateTime<Utc> {
        subtract(self.start_of_today(), TimeDelta::weeks(weeks.into()))
    }

    pub fn resolve(&self, window: Window) -> DateTime<Utc> {
        match window {
            Window::Today => self.start_of_today(),
            Window::Week => self.start_of_week(),
            Window::Month => self.start_of_month(),
            Window::Days(days) => self.days_ago(days),
            Window::Weeks(weeks) => self.weeks_ago(weeks),
        }
    }
}

/// Going further back than chrono can represent means everything counts.
fn subtract(from: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    from.checked_sub_signed(delta)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

    use super::{TimeWindows, Window};

    fn minus_five() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn local(offset: FixedOffset, y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        offset
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
            .to_utc()
    }

    #[test]
    fn test_thursday_afternoon() {
        let offset = minus_five();
        let windows = TimeWindows::new(local(offset, 2024, 3, 14, 15), offset);

        assert_eq!(windows.start_of_today(), local(offset, 2024, 3, 14, 0));
        assert_eq!(windows.start_of_week(), local(offset, 2024, 3, 11, 0));
        assert_eq!(windows.start_of_month(), local(offset, 2024, 3, 1, 0));
        assert_eq!(
            windows.start_of_week(),
            Utc.with_ymd_and_hms(2024, 3, 11, 5, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_local_day_differs_from_utc_day() {
        let offset = minus_five();
        // 21:00 local on the 14th is already the 15th in UTC.
        let windows = TimeWindows::new(local(offset, 2024, 3, 14, 21), offset);
        assert_eq!(windows.start_of_today(), local(offset, 2024, 3, 14, 0));

        let east = FixedOffset::east_opt(9 * 3600).unwrap();
        // 01:00 local on the 1st is still the previous month in UTC.
        let windows = TimeWindows::new(local(east, 2024, 3, 1, 1), east);
        assert_eq!(windows.start_of_month(), local(east, 2024, 3, 1, 0));
        assert_eq!(windows.start_of_today(), local(east, 2024, 3, 1, 0));
    }

    #[test]
    fn test_week_edges() {
        let offset = minus_five();
        let monday = TimeWindows::new(local(offset, 2024, 3, 11, 8), offset);
        assert_eq!(monday.start_of_week(), local(offset, 2024, 3, 11, 0));

        let sunday = TimeWindows::new(local(offset, 2024, 3, 17, 23), offset);
        assert_eq!(sunday.start_of_week(), local(offset, 2024, 3, 11, 0));
    }

    #[test]
    fn test_relative_windows() {
        let offset = Utc.fix();
        let now = Utc.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2024, 3, 14)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
        );
        let windows = TimeWindows::new(now, offset);

        assert_eq!(windows.days_ago(0), windows.start_of_today());
        assert_eq!(windows.resolve(Window::Days(3)), local(offset, 2024, 3, 11, 0));
        assert_eq!(windows.resolve(Window::Weeks(2)), local(offset, 2024, 2, 29, 0));
        assert_eq!(windows.resolve(Window::Today), windows.start_of_today());
        assert_eq!(windows.resolve(Window::Month), local(offset, 2024, 3, 1, 0));
    }

    #[test]
    fn test_huge_window_is_unbounded() {
        let windows = TimeWindows::new(Utc::now(), Utc.fix());
        assert_eq!(windows.days_ago(u32::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
