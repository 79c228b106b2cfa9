use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    backend::{
        NewConfirmedTime, NewMeeting, NewParticipant, NewProfile, NewSchedule, SchedulingBackend,
        StoreError,
    },
    local_store::LocalStore,
    permissions::Actor,
    slot::Slot,
    types::{
        ConfirmedTime, ConfirmedTimeId, Day, Meeting, MeetingId, Participant, ParticipantId,
        Profile, ProfileId, Schedule, ScheduleId, ScheduleTime, University,
    },
    window::MeetingWindow,
};

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 2, day).unwrap()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn slot(day: u32, hour: u32, minute: u32) -> Slot {
    Slot {
        date: date(day),
        time: time(hour, minute),
    }
}

pub fn seoul() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

pub fn instant(rfc3339: &str) -> DateTime<Utc> {
    rfc3339.parse().unwrap()
}

pub fn university() -> University {
    University {
        name: "Yonsei".into(),
        admission: 2019,
        department: "Design".into(),
        grade: 2,
    }
}

pub fn profile(id: ProfileId, nickname: &str) -> Profile {
    Profile {
        id,
        user: Uuid::new_v4(),
        nickname: nickname.into(),
        gender: 3,
        profile_image: None,
        university: None,
    }
}

/// 8th to 10th of February 2021, 14:00 to 15:00, closing at 15:00 in Seoul.
pub fn new_meeting(author: ProfileId) -> NewMeeting {
    NewMeeting {
        author,
        name: "Study".into(),
        window: MeetingWindow {
            start_date: date(8),
            end_date: date(10),
            start_time: time(14, 0),
            end_time: time(15, 0),
        },
        expired_at: instant("2021-02-10T06:00:00Z"),
    }
}

pub fn meeting(id: MeetingId, author: ProfileId) -> Meeting {
    let new = new_meeting(author);
    Meeting {
        id,
        author,
        name: new.name,
        window: new.window,
        expired_at: new.expired_at,
    }
}

pub fn new_confirmed_time(day: u32, start_hour: u32, end_hour: u32) -> NewConfirmedTime {
    NewConfirmedTime {
        start_datetime: date(day).and_time(time(start_hour, 0)),
        end_datetime: date(day).and_time(time(end_hour, 0)),
        place: None,
        link: None,
    }
}

pub fn one_off(start_hour: u32, end_hour: u32) -> ScheduleTime {
    ScheduleTime {
        start_time: time(start_hour, 0),
        end_time: time(end_hour, 0),
        day: None,
    }
}

pub fn weekly(day: Day, start_hour: u32, end_hour: u32) -> ScheduleTime {
    ScheduleTime {
        day: Some(day),
        ..one_off(start_hour, end_hour)
    }
}

pub fn new_schedule(schedule_times: Vec<ScheduleTime>) -> NewSchedule {
    NewSchedule {
        name: "Class".into(),
        start_date: date(1),
        end_date: date(28),
        recurrence: schedule_times.iter().any(|time| time.day.is_some()),
        schedule_times,
    }
}

/// Authenticated user without a profile.
pub fn user() -> Actor {
    Actor {
        user: Some(Uuid::new_v4()),
        ..Actor::default()
    }
}

pub fn admin() -> Actor {
    Actor {
        admin: true,
        ..Actor::default()
    }
}

/// Creates a profile and returns the actor owning it.
pub fn member<T: SchedulingBackend>(backend: &T, nickname: &str) -> Actor {
    let user = Uuid::new_v4();
    let profile = backend
        .insert_profile(NewProfile {
            user,
            nickname: nickname.into(),
            gender: 3,
            profile_image: None,
            university: None,
        })
        .unwrap();
    Actor {
        user: Some(user),
        profile: Some(profile.id),
        admin: false,
    }
}

/// A [`LocalStore`] that can be switched into failing every call.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore {
    pub inner: LocalStore,
    pub unavailable: Arc<AtomicBool>,
}

impl FlakyStore {
    fn guard(&self) -> Result<(), StoreError> {
        match self.unavailable.load(Ordering::SeqCst) {
            true => Err(StoreError::Unavailable("Supposed to fail".into())),
            false => Ok(()),
        }
    }
}

impl SchedulingBackend for FlakyStore {
    fn profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError> {
        self.guard()?;
        self.inner.profile(id)
    }

    fn profile_of_user(&self, user: Uuid) -> Result<Option<Profile>, StoreError> {
        self.guard()?;
        self.inner.profile_of_user(user)
    }

    fn profile_by_nickname(&self, nickname: &str) -> Result<Option<Profile>, StoreError> {
        self.guard()?;
        self.inner.profile_by_nickname(nickname)
    }

    fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        self.guard()?;
        self.inner.insert_profile(profile)
    }

    fn update_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        self.guard()?;
        self.inner.update_profile(profile)
    }

    fn schedules(&self, profile: ProfileId) -> Result<Vec<Schedule>, StoreError> {
        self.guard()?;
        self.inner.schedules(profile)
    }

    fn insert_schedule(&self, profile: ProfileId, schedule: NewSchedule) -> Result<Schedule, StoreError> {
        self.guard()?;
        self.inner.insert_schedule(profile, schedule)
    }

    fn replace_schedule(&self, schedule: Schedule) -> Result<Schedule, StoreError> {
        self.guard()?;
        self.inner.replace_schedule(schedule)
    }

    fn remove_schedule(&self, id: ScheduleId) -> Result<(), StoreError> {
        self.guard()?;
        self.inner.remove_schedule(id)
    }

    fn meeting(&self, id: MeetingId) -> Result<Option<Meeting>, StoreError> {
        self.guard()?;
        self.inner.meeting(id)
    }

    fn meetings_of_profile(&self, profile: ProfileId) -> Result<Vec<Meeting>, StoreError> {
        self.guard()?;
        self.inner.meetings_of_profile(profile)
    }

    fn insert_meeting(&self, meeting: NewMeeting) -> Result<Meeting, StoreError> {
        self.guard()?;
        self.inner.insert_meeting(meeting)
    }

    fn update_meeting(&self, meeting: Meeting) -> Result<Meeting, StoreError> {
        self.guard()?;
        self.inner.update_meeting(meeting)
    }

    fn remove_meeting(&self, id: MeetingId) -> Result<(), StoreError> {
        self.guard()?;
        self.inner.remove_meeting(id)
    }

    fn invite_code(&self, meeting: MeetingId) -> Result<Option<Uuid>, StoreError> {
        self.guard()?;
        self.inner.invite_code(meeting)
    }

    fn issue_invite_code(&self, meeting: MeetingId) -> Result<Uuid, StoreError> {
        self.guard()?;
        self.inner.issue_invite_code(meeting)
    }

    fn meeting_by_invite_code(&self, code: Uuid) -> Result<Option<Meeting>, StoreError> {
        self.guard()?;
        self.inner.meeting_by_invite_code(code)
    }

    fn participants(&self, meeting: MeetingId) -> Result<Vec<Participant>, StoreError> {
        self.guard()?;
        self.inner.participants(meeting)
    }

    fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        self.guard()?;
        self.inner.participant(id)
    }

    fn insert_participant(&self, participant: NewParticipant) -> Result<Participant, StoreError> {
        self.guard()?;
        self.inner.insert_participant(participant)
    }

    fn remove_participant(&self, id: ParticipantId) -> Result<(), StoreError> {
        self.guard()?;
        self.inner.remove_participant(id)
    }

    fn confirmed_times(&self, meeting: MeetingId) -> Result<Vec<ConfirmedTime>, StoreError> {
        self.guard()?;
        self.inner.confirmed_times(meeting)
    }

    fn confirmed_time(&self, id: ConfirmedTimeId) -> Result<Option<ConfirmedTime>, StoreError> {
        self.guard()?;
        self.inner.confirmed_time(id)
    }

    fn confirm_times(
        &self,
        meeting: MeetingId,
        times: Vec<NewConfirmedTime>,
        expired_at: DateTime<Utc>,
    ) -> Result<Vec<ConfirmedTime>, StoreError> {
        self.guard()?;
        self.inner.confirm_times(meeting, times, expired_at)
    }

    fn update_confirmed_time(&self, time: ConfirmedTime) -> Result<ConfirmedTime, StoreError> {
        self.guard()?;
        self.inner.update_confirmed_time(time)
    }

    fn remove_confirmed_time(&self, id: ConfirmedTimeId) -> Result<(), StoreError> {
        self.guard()?;
        self.inner.remove_confirmed_time(id)
    }
}
