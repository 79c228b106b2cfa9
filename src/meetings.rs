use crate::{
    aggregation::{choosable_times as gather, ParticipantAvailability},
    backend::{NewConfirmedTime, NewMeeting, SchedulingBackend},
    clock::to_utc,
    error::{ApiError, OrderingRule},
    permissions::{
        is_author, is_author_or_admin, is_participant, may_access_meeting, owns_participant,
        Action, Actor,
    },
    slot::DayBucket,
    types::{wall_clock, ConfirmedTime, ConfirmedTimeId, Meeting, MeetingId},
    validation::{check_date_order, check_meeting_times, check_not_empty, check_strict_order},
    window::MeetingWindow,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MeetingRequest {
    #[validate(length(min = 1, max = 15))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl MeetingRequest {
    fn window(&self) -> MeetingWindow {
        MeetingWindow {
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    fn check(&self) -> Result<(), ApiError> {
        self.validate()?;
        check_meeting_times(self.start_time, self.end_time)?;
        check_date_order(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmedTimeRequest {
    #[serde(with = "wall_clock")]
    pub start_datetime: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end_datetime: NaiveDateTime,
    #[validate(length(max = 18))]
    pub place: Option<String>,
    #[validate(url)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmRequest {
    #[validate(nested)]
    pub confirmed_times: Vec<ConfirmedTimeRequest>,
}

/// Confirmed time as embedded in meeting views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTimeBrief {
    pub id: ConfirmedTimeId,
    #[serde(with = "wall_clock")]
    pub start_datetime: NaiveDateTime,
    pub place: Option<String>,
    pub link: Option<String>,
}

impl From<&ConfirmedTime> for ConfirmedTimeBrief {
    fn from(time: &ConfirmedTime) -> Self {
        Self {
            id: time.id,
            start_datetime: time.start_datetime,
            place: time.place.clone(),
            link: time.link.clone(),
        }
    }
}

/// What someone holding the invite code gets to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub id: MeetingId,
    pub name: String,
    pub author: String,
    #[serde(flatten)]
    pub window: MeetingWindow,
    pub confirmed_times: Vec<ConfirmedTimeBrief>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetail {
    pub id: MeetingId,
    pub code: Option<Uuid>,
    pub name: String,
    pub author: String,
    pub participants: Vec<String>,
    pub confirmed_times: Vec<ConfirmedTimeBrief>,
}

/// Entry of the meeting list; only upcoming confirmed times, earliest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingTab {
    pub id: MeetingId,
    pub name: String,
    pub confirmed_times: Vec<ConfirmedTimeBrief>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteCode {
    pub code: Uuid,
}

fn stored_meeting<T: SchedulingBackend>(backend: &T, id: MeetingId) -> Result<Meeting, ApiError> {
    backend.meeting(id)?.ok_or(ApiError::NotFound("Meeting"))
}

fn author_nickname<T: SchedulingBackend>(backend: &T, meeting: &Meeting) -> Result<String, ApiError> {
    backend
        .profile(meeting.author)?
        .map(|profile| profile.nickname)
        .ok_or(ApiError::NotFound("Profile"))
}

fn briefs(times: &[ConfirmedTime]) -> Vec<ConfirmedTimeBrief> {
    times.iter().map(ConfirmedTimeBrief::from).collect()
}

/// Closing instant of a window: its last date at its end time.
fn closing(window: &MeetingWindow, offset: FixedOffset) -> DateTime<Utc> {
    to_utc(window.end_date.and_time(window.end_time), offset)
}

pub fn create_meeting<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    request: MeetingRequest,
    offset: FixedOffset,
) -> Result<Meeting, ApiError> {
    let author = actor.require_profile()?;
    request.check()?;

    let window = request.window();
    let meeting = backend.insert_meeting(NewMeeting {
        author,
        name: request.name,
        expired_at: closing(&window, offset),
        window,
    })?;
    info!(id = meeting.id, author, "Meeting created");
    Ok(meeting)
}

/// Anyone holding a valid invite code may look the meeting up.
pub fn meeting_by_code<T: SchedulingBackend>(backend: &T, code: &str) -> Result<MeetingSummary, ApiError> {
    let code = Uuid::parse_str(code).map_err(|_| ApiError::InvalidInviteCode)?;
    let Some(meeting) = backend.meeting_by_invite_code(code)? else {
        warn!(%code, "Unknown invite code");
        return Err(ApiError::InvalidInviteCode);
    };

    Ok(MeetingSummary {
        id: meeting.id,
        author: author_nickname(backend, &meeting)?,
        confirmed_times: briefs(&backend.confirmed_times(meeting.id)?),
        name: meeting.name,
        window: meeting.window,
    })
}

/// Non-expired meetings the actor authored or joined, one page at a time.
pub fn list_meetings<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    page: Option<&str>,
    page_size: usize,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Page<MeetingTab>, ApiError> {
    let profile = actor.require_profile()?;
    let page = match page {
        None => 1,
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|page| *page > 0)
            .ok_or(ApiError::NotFound("Page"))?,
    };

    let meetings: Vec<Meeting> = backend
        .meetings_of_profile(profile)?
        .into_iter()
        .filter(|meeting| meeting.expired_at >= now)
        .collect();
    let count = meetings.len();
    let skip = (page - 1)
        .checked_mul(page_size)
        .filter(|skip| *skip < count || page == 1)
        .ok_or(ApiError::NotFound("Page"))?;

    let wall_now = now.with_timezone(&offset).naive_local();
    let mut results = Vec::new();
    for meeting in meetings.into_iter().skip(skip).take(page_size) {
        let mut upcoming: Vec<ConfirmedTime> = backend
            .confirmed_times(meeting.id)?
            .into_iter()
            .filter(|time| time.end_datetime >= wall_now)
            .collect();
        upcoming.sort_by_key(|time| time.start_datetime);
        results.push(MeetingTab {
            id: meeting.id,
            name: meeting.name,
            confirmed_times: briefs(&upcoming),
        });
    }

    Ok(Page {
        count,
        next: (count - skip > page_size).then_some(page + 1),
        previous: (page > 1).then(|| page - 1),
        results,
    })
}

pub fn meeting_detail<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: MeetingId,
) -> Result<MeetingDetail, ApiError> {
    let meeting = stored_meeting(backend, id)?;
    actor.require_profile()?;

    let participants = backend.participants(id)?;
    if !is_author(actor, &meeting) && !is_participant(actor, &participants) {
        warn!(id, "Meeting requested by someone who was not invited");
        return Err(ApiError::NotParticipant);
    }

    Ok(MeetingDetail {
        id,
        code: backend.invite_code(id)?,
        author: author_nickname(backend, &meeting)?,
        participants: participants.into_iter().map(|p| p.name).collect(),
        confirmed_times: briefs(&backend.confirmed_times(id)?),
        name: meeting.name,
    })
}

/// Replaces name and window. The expiry follows the new window until times
/// are confirmed.
pub fn update_meeting<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: MeetingId,
    request: MeetingRequest,
    offset: FixedOffset,
) -> Result<Meeting, ApiError> {
    actor.require_authenticated()?;
    let meeting = stored_meeting(backend, id)?;
    if !may_access_meeting(actor, &meeting, Action::Update) {
        return Err(ApiError::PermissionDenied);
    }
    request.check()?;

    let window = request.window();
    let expired_at = match backend.confirmed_times(id)?.is_empty() {
        true => closing(&window, offset),
        false => meeting.expired_at,
    };
    let updated = backend.update_meeting(Meeting {
        name: request.name,
        window,
        expired_at,
        ..meeting
    })?;
    info!(id, "Meeting updated");
    Ok(updated)
}

pub fn delete_meeting<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: MeetingId,
) -> Result<(), ApiError> {
    actor.require_authenticated()?;
    let meeting = stored_meeting(backend, id)?;
    if !may_access_meeting(actor, &meeting, Action::Delete) {
        return Err(ApiError::PermissionDenied);
    }
    backend.remove_meeting(id)?;
    info!(id, "Meeting deleted");
    Ok(())
}

pub fn invite_code<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: MeetingId,
) -> Result<InviteCode, ApiError> {
    actor.require_authenticated()?;
    let meeting = stored_meeting(backend, id)?;
    if !is_author_or_admin(actor, &meeting) {
        return Err(ApiError::PermissionDenied);
    }
    Ok(InviteCode {
        code: backend.issue_invite_code(id)?,
    })
}

pub fn choosable_times<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: MeetingId,
) -> Result<Vec<DayBucket>, ApiError> {
    actor.require_authenticated()?;
    let meeting = stored_meeting(backend, id)?;
    if !is_author_or_admin(actor, &meeting) {
        return Err(ApiError::PermissionDenied);
    }

    let participants: Vec<ParticipantAvailability> = backend
        .participants(id)?
        .into_iter()
        .map(|participant| ParticipantAvailability {
            name: participant.name,
            available_times: participant.available_times,
        })
        .collect();
    debug!(id, participants = participants.len(), "Gathering choosable times");
    Ok(gather(&meeting.window, &participants))
}

/// Stores the batch and moves the expiry to the latest confirmed end.
///
/// Nothing is stored unless every time in the batch is valid.
pub fn confirm_times<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: MeetingId,
    request: ConfirmRequest,
    offset: FixedOffset,
) -> Result<Vec<ConfirmedTime>, ApiError> {
    actor.require_authenticated()?;
    let meeting = stored_meeting(backend, id)?;
    if !is_author(actor, &meeting) {
        return Err(ApiError::PermissionDenied);
    }

    check_not_empty(&request.confirmed_times)?;
    request.validate()?;
    for time in &request.confirmed_times {
        check_strict_order(time.start_datetime, time.end_datetime, OrderingRule::StartLaterThanEnd)?;
    }

    let current = match backend.confirmed_times(id)?.is_empty() {
        true => None,
        false => Some(meeting.expired_at),
    };
    let expired_at = request
        .confirmed_times
        .iter()
        .map(|time| to_utc(time.end_datetime, offset))
        .chain(current)
        .max()
        .unwrap_or(meeting.expired_at);

    let times = request
        .confirmed_times
        .into_iter()
        .map(|time| NewConfirmedTime {
            start_datetime: time.start_datetime,
            end_datetime: time.end_datetime,
            place: time.place,
            link: time.link,
        })
        .collect();
    let confirmed = backend.confirm_times(id, times, expired_at)?;
    info!(id, count = confirmed.len(), %expired_at, "Meeting times confirmed");
    Ok(confirmed)
}

/// Removes the actor's own participant entries from the meeting.
pub fn leave_meeting<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: MeetingId,
) -> Result<(), ApiError> {
    actor.require_authenticated()?;
    stored_meeting(backend, id)?;

    let own: Vec<_> = backend
        .participants(id)?
        .into_iter()
        .filter(|participant| owns_participant(actor, participant))
        .collect();
    if own.is_empty() {
        return Err(ApiError::NotParticipant);
    }
    for participant in own {
        backend.remove_participant(participant.id)?;
    }
    info!(id, "Participant left meeting");
    Ok(())
}
