//! Overlap detection for personal schedules.

use crate::{
    error::ApiError,
    types::{Schedule, ScheduleId, ScheduleTime},
};
use chrono::NaiveTime;
use tracing::warn;

/// Half-open overlap: touching endpoints do not conflict.
pub fn is_conflict(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    (a_start <= b_start && b_start < a_end) || (b_start <= a_start && a_start < b_end)
}

fn overlaps(a: &ScheduleTime, b: &ScheduleTime) -> bool {
    a.day == b.day && is_conflict(a.start_time, a.end_time, b.start_time, b.end_time)
}

/// One-off schedules carry a single interval without a day, recurring ones a
/// day on every interval.
pub fn check_recurrence(recurrence: bool, times: &[ScheduleTime]) -> Result<(), ApiError> {
    let consistent = if recurrence {
        times.iter().all(|time| time.day.is_some())
    } else {
        times.len() == 1 && times[0].day.is_none()
    };
    if !consistent {
        return Err(ApiError::RecurrenceMismatch);
    }
    Ok(())
}

/// Fails on the first pair of submitted intervals that overlap on the same day.
pub fn check_batch(times: &[ScheduleTime]) -> Result<(), ApiError> {
    for (i, a) in times.iter().enumerate() {
        if times[i + 1..].iter().any(|b| overlaps(a, b)) {
            warn!(?a, "Submitted schedule times overlap");
            return Err(ApiError::ScheduleConflict);
        }
    }
    Ok(())
}

/// Fails if a submitted interval overlaps any interval of the other stored
/// schedules. `updating` is skipped.
pub fn check_existing(
    times: &[ScheduleTime],
    existing: &[Schedule],
    updating: Option<ScheduleId>,
) -> Result<(), ApiError> {
    let stored = existing
        .iter()
        .filter(|schedule| Some(schedule.id) != updating)
        .flat_map(|schedule| schedule.schedule_times.iter().map(move |time| (schedule.id, time)));

    for (schedule_id, stored_time) in stored {
        if times.iter().any(|time| overlaps(stored_time, time)) {
            warn!(schedule_id, "Schedule time overlaps a stored schedule");
            return Err(ApiError::ScheduleConflict);
        }
    }
    Ok(())
}
