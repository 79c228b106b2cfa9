use crate::{
    backend::SchedulingBackend,
    error::{ApiError, OrderingRule},
    permissions::{may_access_confirmed_time, Action, Actor},
    types::{wall_clock, ConfirmedTime, ConfirmedTimeId, Meeting, MeetingId},
    validation::check_strict_order,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTimeView {
    pub id: ConfirmedTimeId,
    pub meeting: MeetingId,
    pub meeting_name: String,
    #[serde(with = "wall_clock")]
    pub start_datetime: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end_datetime: NaiveDateTime,
    pub place: Option<String>,
    pub link: Option<String>,
}

impl ConfirmedTimeView {
    fn new(time: ConfirmedTime, meeting: &Meeting) -> Self {
        Self {
            id: time.id,
            meeting: meeting.id,
            meeting_name: meeting.name.clone(),
            start_datetime: time.start_datetime,
            end_datetime: time.end_datetime,
            place: time.place,
            link: time.link,
        }
    }
}

/// Partial update; absent fields keep their stored value.
///
/// `place` and `link` are nullable: `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ConfirmedTimePatch {
    #[serde(default, with = "wall_clock::option")]
    pub start_datetime: Option<NaiveDateTime>,
    #[serde(default, with = "wall_clock::option")]
    pub end_datetime: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(max = 18))]
    pub place: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[validate(url)]
    pub link: Option<Option<String>>,
}

/// Maps a present key to `Some`, even when its value is null.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Confirmed times not yet over, of meetings the actor authored or joined.
fn upcoming<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    now: NaiveDateTime,
) -> Result<Vec<(ConfirmedTime, Meeting)>, ApiError> {
    let profile = actor.require_profile()?;

    let mut upcoming = Vec::new();
    for meeting in backend.meetings_of_profile(profile)? {
        for time in backend.confirmed_times(meeting.id)? {
            if time.end_datetime >= now {
                upcoming.push((time, meeting.clone()));
            }
        }
    }
    upcoming.sort_by_key(|(time, _)| time.id);
    Ok(upcoming)
}

fn upcoming_one<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ConfirmedTimeId,
    now: NaiveDateTime,
) -> Result<(ConfirmedTime, Meeting), ApiError> {
    upcoming(backend, actor, now)?
        .into_iter()
        .find(|(time, _)| time.id == id)
        .ok_or(ApiError::NotFound("ConfirmedTime"))
}

pub fn list_confirmed_times<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    now: NaiveDateTime,
) -> Result<Vec<ConfirmedTimeView>, ApiError> {
    Ok(upcoming(backend, actor, now)?
        .into_iter()
        .map(|(time, meeting)| ConfirmedTimeView::new(time, &meeting))
        .collect())
}

pub fn confirmed_time<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ConfirmedTimeId,
    now: NaiveDateTime,
) -> Result<ConfirmedTimeView, ApiError> {
    let (time, meeting) = upcoming_one(backend, actor, id, now)?;
    Ok(ConfirmedTimeView::new(time, &meeting))
}

pub fn update_confirmed_time<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ConfirmedTimeId,
    patch: ConfirmedTimePatch,
    now: NaiveDateTime,
) -> Result<ConfirmedTimeView, ApiError> {
    let (stored, meeting) = upcoming_one(backend, actor, id, now)?;
    if !may_access_confirmed_time(actor, &meeting, Action::Update) {
        return Err(ApiError::PermissionDenied);
    }
    patch.validate()?;

    let time = ConfirmedTime {
        start_datetime: patch.start_datetime.unwrap_or(stored.start_datetime),
        end_datetime: patch.end_datetime.unwrap_or(stored.end_datetime),
        place: patch.place.unwrap_or(stored.place),
        link: patch.link.unwrap_or(stored.link),
        ..stored
    };
    check_strict_order(time.start_datetime, time.end_datetime, OrderingRule::StartLaterThanEnd)?;

    let updated = backend.update_confirmed_time(time)?;
    info!(id, "Confirmed time updated");
    Ok(ConfirmedTimeView::new(updated, &meeting))
}

pub fn delete_confirmed_time<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ConfirmedTimeId,
    now: NaiveDateTime,
) -> Result<(), ApiError> {
    let (_, meeting) = upcoming_one(backend, actor, id, now)?;
    if !may_access_confirmed_time(actor, &meeting, Action::Delete) {
        return Err(ApiError::PermissionDenied);
    }
    backend.remove_confirmed_time(id)?;
    info!(id, "Confirmed time deleted");
    Ok(())
}
