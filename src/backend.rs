use crate::{
    error::ApiError,
    slot::Slot,
    types::{
        ConfirmedTime, ConfirmedTimeId, Meeting, MeetingId, Participant, ParticipantId, Profile,
        ProfileId, Schedule, ScheduleId, ScheduleTime, University,
    },
    window::MeetingWindow,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Columns guarded by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    ProfileUser,
    Nickname,
    ParticipantName,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} does not exist")]
    Missing(&'static str),
    #[error("Unique constraint violated: {0:?}")]
    Duplicate(UniqueKey),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Missing(what) => ApiError::NotFound(what),
            StoreError::Duplicate(UniqueKey::ProfileUser) => ApiError::ProfileConflict,
            StoreError::Duplicate(UniqueKey::Nickname) => ApiError::NicknameConflict,
            StoreError::Duplicate(UniqueKey::ParticipantName) => ApiError::NameConflict,
            StoreError::Unavailable(reason) => ApiError::Storage(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user: Uuid,
    pub nickname: String,
    pub gender: u8,
    pub profile_image: Option<String>,
    pub university: Option<University>,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub recurrence: bool,
    pub schedule_times: Vec<ScheduleTime>,
}

#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub author: ProfileId,
    pub name: String,
    pub window: MeetingWindow,
    pub expired_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub meeting: MeetingId,
    pub user: Option<ProfileId>,
    pub name: String,
    pub available_times: Vec<Slot>,
}

#[derive(Debug, Clone)]
pub struct NewConfirmedTime {
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub place: Option<String>,
    pub link: Option<String>,
}

/// Relational store behind the request handlers.
///
/// Implementations enforce the uniqueness constraints named by [`UniqueKey`]
/// and apply every write atomically.
pub trait SchedulingBackend: Clone + Send + Sync + 'static {
    fn profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError>;
    fn profile_of_user(&self, user: Uuid) -> Result<Option<Profile>, StoreError>;
    fn profile_by_nickname(&self, nickname: &str) -> Result<Option<Profile>, StoreError>;
    fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError>;
    fn update_profile(&self, profile: Profile) -> Result<Profile, StoreError>;

    fn schedules(&self, profile: ProfileId) -> Result<Vec<Schedule>, StoreError>;
    fn insert_schedule(&self, profile: ProfileId, schedule: NewSchedule) -> Result<Schedule, StoreError>;
    /// Replaces the schedule and all of its times.
    fn replace_schedule(&self, schedule: Schedule) -> Result<Schedule, StoreError>;
    fn remove_schedule(&self, id: ScheduleId) -> Result<(), StoreError>;

    fn meeting(&self, id: MeetingId) -> Result<Option<Meeting>, StoreError>;
    /// Meetings the profile authored or takes part in, by id.
    fn meetings_of_profile(&self, profile: ProfileId) -> Result<Vec<Meeting>, StoreError>;
    fn insert_meeting(&self, meeting: NewMeeting) -> Result<Meeting, StoreError>;
    fn update_meeting(&self, meeting: Meeting) -> Result<Meeting, StoreError>;
    /// Removes the meeting with its invite code, participants and confirmed times.
    fn remove_meeting(&self, id: MeetingId) -> Result<(), StoreError>;
    fn invite_code(&self, meeting: MeetingId) -> Result<Option<Uuid>, StoreError>;
    /// Returns the meeting's invite code, creating one if there is none yet.
    fn issue_invite_code(&self, meeting: MeetingId) -> Result<Uuid, StoreError>;
    fn meeting_by_invite_code(&self, code: Uuid) -> Result<Option<Meeting>, StoreError>;

    fn participants(&self, meeting: MeetingId) -> Result<Vec<Participant>, StoreError>;
    fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError>;
    fn insert_participant(&self, participant: NewParticipant) -> Result<Participant, StoreError>;
    fn remove_participant(&self, id: ParticipantId) -> Result<(), StoreError>;

    fn confirmed_times(&self, meeting: MeetingId) -> Result<Vec<ConfirmedTime>, StoreError>;
    fn confirmed_time(&self, id: ConfirmedTimeId) -> Result<Option<ConfirmedTime>, StoreError>;
    /// Stores all times and the meeting's new expiry in one step.
    fn confirm_times(
        &self,
        meeting: MeetingId,
        times: Vec<NewConfirmedTime>,
        expired_at: DateTime<Utc>,
    ) -> Result<Vec<ConfirmedTime>, StoreError>;
    fn update_confirmed_time(&self, time: ConfirmedTime) -> Result<ConfirmedTime, StoreError>;
    fn remove_confirmed_time(&self, id: ConfirmedTimeId) -> Result<(), StoreError>;
}
