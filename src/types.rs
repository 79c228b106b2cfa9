use crate::{slot::Slot, window::MeetingWindow};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub type ProfileId = u64;
pub type MeetingId = u64;
pub type ParticipantId = u64;
pub type ConfirmedTimeId = u64;
pub type ScheduleId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_admission"))]
pub struct University {
    #[validate(length(min = 1, max = 30))]
    pub name: String,
    pub admission: i32,
    #[validate(length(min = 1, max = 30))]
    pub department: String,
    #[validate(range(min = 1, max = 6))]
    pub grade: u8,
}

/// Admission years run from 1900 to next year.
fn validate_admission(university: &University) -> Result<(), ValidationError> {
    let latest = Utc::now().year() + 1;
    if !(1900..=latest).contains(&university.admission) {
        return Err(ValidationError::new("admission_year"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(skip_serializing)]
    pub user: Uuid,
    pub nickname: String,
    pub gender: u8,
    pub profile_image: Option<String>,
    pub university: Option<University>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub author: ProfileId,
    pub name: String,
    #[serde(flatten)]
    pub window: MeetingWindow,
    pub expired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub meeting: MeetingId,
    pub user: Option<ProfileId>,
    pub name: String,
    pub available_times: Vec<Slot>,
}

/// Final time picked by a meeting's author, in the service's wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTime {
    pub id: ConfirmedTimeId,
    pub meeting: MeetingId,
    #[serde(with = "wall_clock")]
    pub start_datetime: NaiveDateTime,
    #[serde(with = "wall_clock")]
    pub end_datetime: NaiveDateTime,
    pub place: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Day {
    #[serde(rename = "월")]
    Monday,
    #[serde(rename = "화")]
    Tuesday,
    #[serde(rename = "수")]
    Wednesday,
    #[serde(rename = "목")]
    Thursday,
    #[serde(rename = "금")]
    Friday,
    #[serde(rename = "토")]
    Saturday,
    #[serde(rename = "일")]
    Sunday,
}

/// One interval of a personal schedule. `day` is `None` for one-off schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTime {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub day: Option<Day>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub id: ScheduleId,
    #[serde(skip_serializing)]
    pub profile: ProfileId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub recurrence: bool,
    pub schedule_times: Vec<ScheduleTime>,
}

/// `YYYY-MM-DD HH:MM:SS` on the way out; ISO 8601 is accepted as well.
pub mod wall_clock {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(raw, FORMAT).or_else(|_| raw.parse::<NaiveDateTime>())
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::parse(&raw).map_err(D::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn university(admission: i32, grade: u8) -> University {
        University {
            name: "Seoul National".into(),
            admission,
            department: "Physics".into(),
            grade,
        }
    }

    #[test_case::test_case(university(2020, 3), true ; "valid")]
    #[test_case::test_case(university(1899, 3), false ; "admission too early")]
    #[test_case::test_case(university(Utc::now().year() + 2, 1), false ; "admission in the future")]
    #[test_case::test_case(university(2020, 0), false ; "grade too low")]
    #[test_case::test_case(university(2020, 7), false ; "grade too high")]
    fn university_rules(university: University, valid: bool) {
        assert_eq!(university.validate().is_ok(), valid);
    }

    #[test]
    fn days_use_korean_abbreviations() {
        assert_eq!(serde_json::to_string(&Day::Monday).unwrap(), "\"월\"");
        let day: Day = serde_json::from_str("\"일\"").unwrap();
        assert_eq!(day, Day::Sunday);
    }

    #[test]
    fn confirmed_time_uses_wall_clock_format() {
        let confirmed = ConfirmedTime {
            id: 1,
            meeting: 2,
            start_datetime: wall_clock::parse("2021-02-08 17:30:00").unwrap(),
            end_datetime: wall_clock::parse("2021-02-08T18:30:00").unwrap(),
            place: None,
            link: None,
        };

        let value = serde_json::to_value(&confirmed).unwrap();
        assert_eq!(value["start_datetime"], "2021-02-08 17:30:00");
        assert_eq!(value["end_datetime"], "2021-02-08 18:30:00");

        let decoded: ConfirmedTime = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, confirmed);
    }

    #[test]
    fn meeting_window_is_flattened() {
        let meeting = Meeting {
            id: 1,
            author: 1,
            name: "Study".into(),
            window: MeetingWindow {
                start_date: NaiveDate::from_ymd_opt(2021, 2, 8).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2021, 2, 9).unwrap(),
                start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            },
            expired_at: Utc::now(),
        };

        let value = serde_json::to_value(&meeting).unwrap();
        assert_eq!(value["start_time"], "14:00:00");
        assert_eq!(value["end_date"], "2021-02-09");
    }
}
