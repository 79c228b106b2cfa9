use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub const SLOT_MINUTES: u32 = 10;

/// A ten-minute mark on a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// One slot of a day bucket as handed out to the meeting author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDetail {
    pub time: NaiveTime,
    pub unavailable_member: Option<String>,
}

impl SlotDetail {
    pub fn open(time: NaiveTime) -> Self {
        Self {
            time,
            unavailable_member: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub detail: Vec<SlotDetail>,
}

/// 23:59 stands for "until the end of the day".
pub fn is_day_end(time: NaiveTime) -> bool {
    time.hour() == 23 && time.minute() == 59
}

/// Granularity accepted for a meeting's start and end time.
pub fn is_meeting_grid(time: NaiveTime) -> bool {
    time.minute() % SLOT_MINUTES == 0 || is_day_end(time)
}

/// Granularity accepted for personal schedule intervals.
pub fn is_schedule_grid(time: NaiveTime) -> bool {
    (time.second() == 0 && time.nanosecond() == 0) || is_day_end(time)
}

/// Reported availability has to sit exactly on a ten-minute mark.
pub fn is_slot_mark(time: NaiveTime) -> bool {
    time.minute() % SLOT_MINUTES == 0
}

/// Slots of `hour` from `min_start` (inclusive) to `min_end` (exclusive).
/// Hours past 23 yield nothing.
pub fn ten_minutes(hour: u32, min_start: u32, min_end: u32) -> impl Iterator<Item = NaiveTime> {
    (min_start..min_end)
        .step_by(SLOT_MINUTES as usize)
        .filter_map(move |minute| NaiveTime::from_hms_opt(hour, minute, 0))
}
