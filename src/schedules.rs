use crate::{
    backend::{NewSchedule, SchedulingBackend},
    conflict::{check_batch, check_existing, check_recurrence},
    error::ApiError,
    permissions::{may_access_schedule, Actor},
    types::{ProfileId, Schedule, ScheduleId, ScheduleTime},
    validation::{check_date_order, check_not_empty, check_schedule_times},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScheduleRequest {
    #[validate(length(min = 1, max = 10))]
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub recurrence: bool,
    pub schedule_times: Vec<ScheduleTime>,
}

impl ScheduleRequest {
    /// Field rules, then every interval, then the whole schedule.
    fn check(&self) -> Result<(), ApiError> {
        self.validate()?;
        check_not_empty(&self.schedule_times)?;
        for time in &self.schedule_times {
            check_schedule_times(time.start_time, time.end_time)?;
        }
        check_date_order(self.start_date, self.end_date)?;
        check_recurrence(self.recurrence, &self.schedule_times)
    }
}

fn owned_schedule<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ScheduleId,
) -> Result<(ProfileId, Schedule), ApiError> {
    let profile = actor.require_profile()?;
    backend
        .schedules(profile)?
        .into_iter()
        .find(|schedule| schedule.id == id && may_access_schedule(actor, schedule))
        .map(|schedule| (profile, schedule))
        .ok_or(ApiError::NotFound("Schedule"))
}

pub fn list_schedules<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
) -> Result<Vec<Schedule>, ApiError> {
    let profile = actor.require_profile()?;
    Ok(backend.schedules(profile)?)
}

pub fn schedule<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ScheduleId,
) -> Result<Schedule, ApiError> {
    owned_schedule(backend, actor, id).map(|(_, schedule)| schedule)
}

pub fn create_schedule<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    request: ScheduleRequest,
) -> Result<Schedule, ApiError> {
    let profile = actor.require_profile()?;
    request.check()?;
    check_batch(&request.schedule_times)?;
    check_existing(&request.schedule_times, &backend.schedules(profile)?, None)?;

    let schedule = backend.insert_schedule(
        profile,
        NewSchedule {
            name: request.name,
            start_date: request.start_date,
            end_date: request.end_date,
            recurrence: request.recurrence,
            schedule_times: request.schedule_times,
        },
    )?;
    info!(id = schedule.id, profile, "Schedule created");
    Ok(schedule)
}

/// Replaces the schedule together with all of its intervals.
pub fn update_schedule<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ScheduleId,
    request: ScheduleRequest,
) -> Result<Schedule, ApiError> {
    let (profile, stored) = owned_schedule(backend, actor, id)?;
    request.check()?;
    check_batch(&request.schedule_times)?;
    check_existing(&request.schedule_times, &backend.schedules(profile)?, Some(id))?;

    let schedule = backend.replace_schedule(Schedule {
        name: request.name,
        start_date: request.start_date,
        end_date: request.end_date,
        recurrence: request.recurrence,
        schedule_times: request.schedule_times,
        ..stored
    })?;
    info!(id, "Schedule replaced");
    Ok(schedule)
}

pub fn delete_schedule<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ScheduleId,
) -> Result<(), ApiError> {
    owned_schedule(backend, actor, id)?;
    backend.remove_schedule(id)?;
    info!(id, "Schedule deleted");
    Ok(())
}
