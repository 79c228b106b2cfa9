use crate::slot::{is_day_end, ten_minutes, DayBucket, SlotDetail};
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Date range and daily time range a meeting may take place in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl MeetingWindow {
    /// True when the daily range runs past midnight. An end of 23:59 never wraps.
    pub fn wraps(&self) -> bool {
        !(is_day_end(self.end_time) || self.start_time < self.end_time)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end_date = self.end_date;
        self.start_date
            .iter_days()
            .take_while(move |date| *date <= end_date)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

// (hour, minute) of the end bound, with 23:59 meaning 24:00.
fn end_bound(end_time: NaiveTime) -> (u32, u32) {
    if is_day_end(end_time) {
        (24, 0)
    } else {
        (end_time.hour(), end_time.minute())
    }
}

/// The slots of a single day of the window.
pub fn day_template(window: &MeetingWindow) -> Vec<NaiveTime> {
    let (start_hour, start_minute) = (window.start_time.hour(), window.start_time.minute());
    let (end_hour, end_minute) = end_bound(window.end_time);
    let mut times = Vec::new();

    if !window.wraps() {
        times.extend(ten_minutes(start_hour, start_minute, 60));
        // Full hours stop before end_hour - 1, not before end_hour.
        for hour in start_hour + 1..end_hour.saturating_sub(1) {
            times.extend(ten_minutes(hour, 0, 60));
        }
        times.extend(ten_minutes(end_hour, 0, end_minute));
    } else {
        for hour in 0..end_hour {
            times.extend(ten_minutes(hour, 0, 60));
        }
        times.extend(ten_minutes(end_hour, 0, end_minute));
        times.extend(ten_minutes(start_hour, start_minute, 60));
        for hour in start_hour + 1..24 {
            times.extend(ten_minutes(hour, 0, 60));
        }
    }
    times
}

/// Every date of the window with its full set of open slots.
///
/// Each bucket owns its own detail list.
pub fn expand(window: &MeetingWindow) -> Vec<DayBucket> {
    let template: Vec<SlotDetail> = day_template(window)
        .into_iter()
        .map(SlotDetail::open)
        .collect();

    window
        .dates()
        .map(|date| DayBucket {
            date,
            detail: template.clone(),
        })
        .collect()
}
