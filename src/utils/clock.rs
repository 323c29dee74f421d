use chrono::{DateTime, FixedOffset, Local, Utc};

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn time(&self) -> DateTime<Utc>;

    /// Offset of local time from UTC. Local wall-clock input and day boundaries are interpreted
    /// with it.
    fn offset(&self) -> FixedOffset;
}

/// System clock. The local offset is captured once on creation and kept for the lifetime of
/// the value, so a daylight saving switch while running is not picked up.
pub struct DefaultClock {
    offset: FixedOffset,
}

impl DefaultClock {
    pub fn new() -> Self {
        Self {
            offset: *Local::now().offset(),
        }
    }
}

impl Default for DefaultClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}
