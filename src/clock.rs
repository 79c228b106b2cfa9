use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Reads a wall-clock value in the service's fixed zone.
pub fn to_utc(wall_clock: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    match offset.from_local_datetime(&wall_clock).single() {
        Some(local) => local.with_timezone(&Utc),
        None => wall_clock.and_utc(),
    }
}

/// The current wall-clock time in the service's fixed zone.
pub fn wall_clock_now(clock: &dyn Clock, offset: FixedOffset) -> NaiveDateTime {
    clock.now().with_timezone(&offset).naive_local()
}
