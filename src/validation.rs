use crate::{
    error::{ApiError, OrderingRule},
    slot::{is_meeting_grid, is_schedule_grid, is_slot_mark, Slot},
    window::MeetingWindow,
};
use chrono::{NaiveDate, NaiveTime};

pub fn check_date_order(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if start > end {
        return Err(ApiError::InvalidOrdering(OrderingRule::StartLaterThanEnd));
    }
    Ok(())
}

/// Strict `start < end`, reported with the given rule.
pub fn check_strict_order<T: PartialOrd>(start: T, end: T, rule: OrderingRule) -> Result<(), ApiError> {
    if start >= end {
        return Err(ApiError::InvalidOrdering(rule));
    }
    Ok(())
}

pub fn check_meeting_times(start: NaiveTime, end: NaiveTime) -> Result<(), ApiError> {
    if is_meeting_grid(start) && is_meeting_grid(end) {
        return Ok(());
    }
    Err(ApiError::OffGridTime)
}

pub fn check_schedule_times(start: NaiveTime, end: NaiveTime) -> Result<(), ApiError> {
    if !(is_schedule_grid(start) && is_schedule_grid(end)) {
        return Err(ApiError::OffGridTime);
    }
    check_strict_order(start, end, OrderingRule::StartEqualOrLaterThanEnd)
}

pub fn check_not_empty<T>(batch: &[T]) -> Result<(), ApiError> {
    if batch.is_empty() {
        return Err(ApiError::EmptyInput);
    }
    Ok(())
}

/// Whether a reported slot lies inside the meeting's dates and daily range.
pub fn within_window(window: &MeetingWindow, slot: &Slot) -> bool {
    if !window.contains_date(slot.date) {
        return false;
    }
    if window.start_time < window.end_time {
        window.start_time <= slot.time && slot.time < window.end_time
    } else {
        !(window.end_time <= slot.time && slot.time < window.start_time)
    }
}

/// Validates a batch of reported availability against a meeting.
pub fn check_available_times(window: &MeetingWindow, slots: &[Slot]) -> Result<(), ApiError> {
    check_not_empty(slots)?;
    if !slots.iter().all(|slot| is_slot_mark(slot.time)) {
        return Err(ApiError::OffGridTime);
    }
    if !slots.iter().all(|slot| within_window(window, slot)) {
        return Err(ApiError::OutOfWindow);
    }
    Ok(())
}
