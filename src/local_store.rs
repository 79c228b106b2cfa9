use crate::{
    backend::{
        NewConfirmedTime, NewMeeting, NewParticipant, NewProfile, NewSchedule, SchedulingBackend,
        StoreError, UniqueKey,
    },
    types::{
        ConfirmedTime, ConfirmedTimeId, Meeting, MeetingId, Participant, ParticipantId, Profile,
        ProfileId, Schedule, ScheduleId,
    },
};
use chrono::{DateTime, Utc};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    last_id: u64,
    profiles: BTreeMap<ProfileId, Profile>,
    schedules: BTreeMap<ScheduleId, Schedule>,
    meetings: BTreeMap<MeetingId, Meeting>,
    invite_codes: HashMap<MeetingId, Uuid>,
    participants: BTreeMap<ParticipantId, Participant>,
    confirmed_times: BTreeMap<ConfirmedTimeId, ConfirmedTime>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    fn nickname_taken(&self, nickname: &str, except: Option<ProfileId>) -> bool {
        self.profiles
            .values()
            .any(|profile| profile.nickname == nickname && Some(profile.id) != except)
    }
}

/// In-memory store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    tables: Arc<Mutex<Tables>>,
}

fn missing(what: &'static str) -> StoreError {
    error!(what, "Record does not exist");
    StoreError::Missing(what)
}

impl SchedulingBackend for LocalStore {
    fn profile(&self, id: ProfileId) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables.lock().unwrap().profiles.get(&id).cloned())
    }

    fn profile_of_user(&self, user: Uuid) -> Result<Option<Profile>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.profiles.values().find(|p| p.user == user).cloned())
    }

    fn profile_by_nickname(&self, nickname: &str) -> Result<Option<Profile>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .profiles
            .values()
            .find(|p| p.nickname == nickname)
            .cloned())
    }

    fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.profiles.values().any(|p| p.user == profile.user) {
            return Err(StoreError::Duplicate(UniqueKey::ProfileUser));
        }
        if tables.nickname_taken(&profile.nickname, None) {
            return Err(StoreError::Duplicate(UniqueKey::Nickname));
        }

        let id = tables.next_id();
        let profile = Profile {
            id,
            user: profile.user,
            nickname: profile.nickname,
            gender: profile.gender,
            profile_image: profile.profile_image,
            university: profile.university,
        };
        tables.profiles.insert(id, profile.clone());
        Ok(profile)
    }

    fn update_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.nickname_taken(&profile.nickname, Some(profile.id)) {
            return Err(StoreError::Duplicate(UniqueKey::Nickname));
        }
        match tables.profiles.get_mut(&profile.id) {
            Some(stored) => *stored = profile.clone(),
            None => return Err(missing("Profile")),
        }
        Ok(profile)
    }

    fn schedules(&self, profile: ProfileId) -> Result<Vec<Schedule>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .schedules
            .values()
            .filter(|schedule| schedule.profile == profile)
            .cloned()
            .collect())
    }

    fn insert_schedule(&self, profile: ProfileId, schedule: NewSchedule) -> Result<Schedule, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.profiles.contains_key(&profile) {
            return Err(missing("Profile"));
        }

        let id = tables.next_id();
        let schedule = Schedule {
            id,
            profile,
            name: schedule.name,
            start_date: schedule.start_date,
            end_date: schedule.end_date,
            recurrence: schedule.recurrence,
            schedule_times: schedule.schedule_times,
        };
        tables.schedules.insert(id, schedule.clone());
        Ok(schedule)
    }

    fn replace_schedule(&self, schedule: Schedule) -> Result<Schedule, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.schedules.get_mut(&schedule.id) {
            Some(stored) => *stored = schedule.clone(),
            None => return Err(missing("Schedule")),
        }
        Ok(schedule)
    }

    fn remove_schedule(&self, id: ScheduleId) -> Result<(), StoreError> {
        if self.tables.lock().unwrap().schedules.remove(&id).is_none() {
            return Err(missing("Schedule"));
        }
        Ok(())
    }

    fn meeting(&self, id: MeetingId) -> Result<Option<Meeting>, StoreError> {
        Ok(self.tables.lock().unwrap().meetings.get(&id).cloned())
    }

    fn meetings_of_profile(&self, profile: ProfileId) -> Result<Vec<Meeting>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let joined = |meeting: &Meeting| {
            tables
                .participants
                .values()
                .any(|p| p.meeting == meeting.id && p.user == Some(profile))
        };
        Ok(tables
            .meetings
            .values()
            .filter(|meeting| meeting.author == profile || joined(meeting))
            .cloned()
            .collect())
    }

    fn insert_meeting(&self, meeting: NewMeeting) -> Result<Meeting, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.profiles.contains_key(&meeting.author) {
            return Err(missing("Profile"));
        }

        let id = tables.next_id();
        let meeting = Meeting {
            id,
            author: meeting.author,
            name: meeting.name,
            window: meeting.window,
            expired_at: meeting.expired_at,
        };
        tables.meetings.insert(id, meeting.clone());
        Ok(meeting)
    }

    fn update_meeting(&self, meeting: Meeting) -> Result<Meeting, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.meetings.get_mut(&meeting.id) {
            Some(stored) => *stored = meeting.clone(),
            None => return Err(missing("Meeting")),
        }
        Ok(meeting)
    }

    fn remove_meeting(&self, id: MeetingId) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.meetings.remove(&id).is_none() {
            return Err(missing("Meeting"));
        }
        tables.invite_codes.remove(&id);
        tables.participants.retain(|_, p| p.meeting != id);
        tables.confirmed_times.retain(|_, c| c.meeting != id);
        Ok(())
    }

    fn invite_code(&self, meeting: MeetingId) -> Result<Option<Uuid>, StoreError> {
        Ok(self.tables.lock().unwrap().invite_codes.get(&meeting).copied())
    }

    fn issue_invite_code(&self, meeting: MeetingId) -> Result<Uuid, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.meetings.contains_key(&meeting) {
            return Err(missing("Meeting"));
        }
        Ok(*tables
            .invite_codes
            .entry(meeting)
            .or_insert_with(Uuid::new_v4))
    }

    fn meeting_by_invite_code(&self, code: Uuid) -> Result<Option<Meeting>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .invite_codes
            .iter()
            .find(|(_, stored)| **stored == code)
            .and_then(|(meeting, _)| tables.meetings.get(meeting))
            .cloned())
    }

    fn participants(&self, meeting: MeetingId) -> Result<Vec<Participant>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .participants
            .values()
            .filter(|p| p.meeting == meeting)
            .cloned()
            .collect())
    }

    fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        Ok(self.tables.lock().unwrap().participants.get(&id).cloned())
    }

    fn insert_participant(&self, participant: NewParticipant) -> Result<Participant, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.meetings.contains_key(&participant.meeting) {
            return Err(missing("Meeting"));
        }
        if tables
            .participants
            .values()
            .any(|p| p.meeting == participant.meeting && p.name == participant.name)
        {
            return Err(StoreError::Duplicate(UniqueKey::ParticipantName));
        }

        let id = tables.next_id();
        let participant = Participant {
            id,
            meeting: participant.meeting,
            user: participant.user,
            name: participant.name,
            available_times: participant.available_times,
        };
        tables.participants.insert(id, participant.clone());
        Ok(participant)
    }

    fn remove_participant(&self, id: ParticipantId) -> Result<(), StoreError> {
        if self.tables.lock().unwrap().participants.remove(&id).is_none() {
            return Err(missing("Participant"));
        }
        Ok(())
    }

    fn confirmed_times(&self, meeting: MeetingId) -> Result<Vec<ConfirmedTime>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .confirmed_times
            .values()
            .filter(|c| c.meeting == meeting)
            .cloned()
            .collect())
    }

    fn confirmed_time(&self, id: ConfirmedTimeId) -> Result<Option<ConfirmedTime>, StoreError> {
        Ok(self.tables.lock().unwrap().confirmed_times.get(&id).cloned())
    }

    fn confirm_times(
        &self,
        meeting: MeetingId,
        times: Vec<NewConfirmedTime>,
        expired_at: DateTime<Utc>,
    ) -> Result<Vec<ConfirmedTime>, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.meetings.get_mut(&meeting) {
            Some(stored) => stored.expired_at = expired_at,
            None => return Err(missing("Meeting")),
        }

        let mut confirmed = Vec::with_capacity(times.len());
        for time in times {
            let id = tables.next_id();
            let time = ConfirmedTime {
                id,
                meeting,
                start_datetime: time.start_datetime,
                end_datetime: time.end_datetime,
                place: time.place,
                link: time.link,
            };
            tables.confirmed_times.insert(id, time.clone());
            confirmed.push(time);
        }
        Ok(confirmed)
    }

    fn update_confirmed_time(&self, time: ConfirmedTime) -> Result<ConfirmedTime, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.confirmed_times.get_mut(&time.id) {
            Some(stored) => *stored = time.clone(),
            None => return Err(missing("ConfirmedTime")),
        }
        Ok(time)
    }

    fn remove_confirmed_time(&self, id: ConfirmedTimeId) -> Result<(), StoreError> {
        if self.tables.lock().unwrap().confirmed_times.remove(&id).is_none() {
            return Err(missing("ConfirmedTime"));
        }
        Ok(())
    }
}
