use crate::{
    backend::{NewParticipant, SchedulingBackend, StoreError},
    error::ApiError,
    permissions::{may_access_participant, Action, Actor},
    profiles::NICKNAME,
    slot::Slot,
    types::{MeetingId, Participant, ParticipantId},
    validation::check_available_times,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 10), regex(path = *NICKNAME))]
    pub name: String,
    pub meeting_id: MeetingId,
    #[validate(length(max = 50))]
    pub code: String,
    #[serde(default)]
    pub available_times: Vec<Slot>,
}

/// Joins a meeting that has not expired yet.
///
/// Once times are confirmed the participant joins without availability.
pub fn join_meeting<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    request: JoinRequest,
    now: DateTime<Utc>,
) -> Result<Participant, ApiError> {
    request.validate()?;

    let meeting = backend
        .meeting(request.meeting_id)?
        .filter(|meeting| meeting.expired_at > now)
        .ok_or(ApiError::NotFound("Meeting"))?;

    let expected = backend.invite_code(meeting.id)?.map(|code| code.to_string());
    if expected.as_deref() != Some(request.code.as_str()) {
        warn!(meeting = meeting.id, "Join attempt with a wrong invite code");
        return Err(ApiError::InvalidInviteCode);
    }

    let available_times = match backend.confirmed_times(meeting.id)?.is_empty() {
        true => {
            check_available_times(&meeting.window, &request.available_times)?;
            request.available_times
        }
        false => Vec::new(),
    };

    let participant = match backend.insert_participant(NewParticipant {
        meeting: meeting.id,
        user: actor.profile,
        name: request.name,
        available_times,
    }) {
        Err(StoreError::Duplicate(_)) => {
            warn!(meeting = meeting.id, "Participant name already taken");
            return Err(ApiError::NameConflict);
        }
        result => result?,
    };
    info!(id = participant.id, meeting = meeting.id, "Participant joined");
    Ok(participant)
}

/// Succeeds when `name` is still free in the meeting.
pub fn check_name<T: SchedulingBackend>(
    backend: &T,
    name: Option<&str>,
    meeting_id: Option<&str>,
) -> Result<(), ApiError> {
    let (Some(name), Some(meeting_id)) = (name, meeting_id) else {
        return Err(ApiError::MissingParameter("name, meeting_id"));
    };
    let meeting_id: MeetingId = meeting_id
        .parse()
        .map_err(|_| ApiError::MissingParameter("meeting_id"))?;

    if backend
        .participants(meeting_id)?
        .iter()
        .any(|participant| participant.name == name)
    {
        return Err(ApiError::NameConflict);
    }
    Ok(())
}

pub fn remove_participant<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ParticipantId,
) -> Result<(), ApiError> {
    let participant = backend
        .participant(id)?
        .ok_or(ApiError::NotFound("Participant"))?;
    let meeting = backend
        .meeting(participant.meeting)?
        .ok_or(ApiError::NotFound("Meeting"))?;
    if !may_access_participant(actor, &participant, &meeting, Action::Delete) {
        return Err(ApiError::PermissionDenied);
    }

    backend.remove_participant(id)?;
    info!(id, meeting = meeting.id, "Participant removed");
    Ok(())
}
