use crate::{
    backend::SchedulingBackend,
    clock::{wall_clock_now, Clock, SystemClock},
    configuration::Configuration,
    confirmed_times::{self, ConfirmedTimePatch, ConfirmedTimeView},
    envelope::Envelope,
    error::ApiError,
    meetings::{
        self, ConfirmRequest, InviteCode, MeetingDetail, MeetingRequest, MeetingTab, Page,
    },
    participants::{self, JoinRequest},
    permissions::Actor,
    profiles::{self, ProfileRequest},
    schedules::{self, ScheduleRequest},
    slot::DayBucket,
    types::{
        ConfirmedTime, ConfirmedTimeId, Meeting, MeetingId, Participant, ParticipantId, Profile,
        ProfileId, Schedule, ScheduleId,
    },
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, Request, State,
    },
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use uuid::Uuid;

/// Set by the upstream authentication layer to the authenticated user's id.
pub const USER_HEADER: &str = "x-user-id";
pub const ADMIN_HEADER: &str = "x-admin-password";

#[derive(Debug, Clone)]
pub struct Settings {
    pub admin_password: Option<String>,
    pub utc_offset: FixedOffset,
    pub page_size: usize,
}

#[derive(Clone)]
pub struct AppState<T: SchedulingBackend> {
    pub backend: T,
    pub settings: Settings,
    pub clock: Arc<dyn Clock>,
}

impl<T: SchedulingBackend> AppState<T> {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn wall_clock_now(&self) -> NaiveDateTime {
        wall_clock_now(self.clock.as_ref(), self.settings.utc_offset)
    }
}

type Reply<T> = Result<Envelope<T>, ApiError>;

pub fn create_app<T: SchedulingBackend, C: Configuration>(backend: T, configuration: C) -> Router {
    create_app_with_clock(backend, configuration, Arc::new(SystemClock))
}

pub fn create_app_with_clock<T: SchedulingBackend, C: Configuration>(
    backend: T,
    configuration: C,
    clock: Arc<dyn Clock>,
) -> Router {
    let state = AppState {
        backend,
        settings: Settings {
            admin_password: configuration.admin_password(),
            utc_offset: configuration.utc_offset(),
            page_size: configuration.page_size(),
        },
        clock,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let profiles = Router::new()
        .route("/profiles", get(find_profile::<T>).post(create_profile::<T>))
        .route("/profiles/me", get(my_profile::<T>))
        .route("/profiles/:id", put(update_profile::<T>));

    let schedules = Router::new()
        .route("/schedules", get(list_schedules::<T>).post(create_schedule::<T>))
        .route(
            "/schedules/:id",
            get(schedule::<T>)
                .put(update_schedule::<T>)
                .delete(delete_schedule::<T>),
        );

    let meetings = Router::new()
        .route("/meetings", get(list_meetings::<T>).post(create_meeting::<T>))
        .route(
            "/meetings/:id",
            get(meeting_detail::<T>)
                .put(update_meeting::<T>)
                .delete(delete_meeting::<T>),
        )
        .route("/meetings/:id/invite-code", get(invite_code::<T>))
        .route("/meetings/:id/choosable-times", get(choosable_times::<T>))
        .route("/meetings/:id/confirmed-times", post(confirm_times::<T>))
        .route(
            "/meetings/:id/participants",
            delete(leave_meeting::<T>),
        );

    let participants = Router::new()
        .route("/participants", get(check_name::<T>).post(join_meeting::<T>))
        .route(
            "/participants/:id",
            delete(remove_participant::<T>),
        );

    let confirmed_times = Router::new()
        .route("/confirmed-times", get(list_confirmed_times::<T>))
        .route(
            "/confirmed-times/:id",
            get(confirmed_time::<T>)
                .patch(update_confirmed_time::<T>)
                .delete(delete_confirmed_time::<T>),
        );

    Router::new()
        .merge(profiles)
        .merge(schedules)
        .merge(meetings)
        .merge(participants)
        .merge(confirmed_times)
        .fallback(unknown_route)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_actor::<T>,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Resolves the requesting [`Actor`] once and hands it to the handlers.
async fn resolve_actor<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = request.headers();

    let user = match headers.get(USER_HEADER) {
        None => None,
        Some(value) => match value.to_str().map(Uuid::parse_str) {
            Ok(Ok(user)) => Some(user),
            _ => {
                warn!("Malformed user id header");
                return Err(ApiError::NotAuthenticated);
            }
        },
    };

    let admin = match header(headers, ADMIN_HEADER) {
        None => false,
        Some(given) if state.settings.admin_password.as_deref() == Some(given) => true,
        Some(_) => {
            warn!("Wrong admin password");
            return Err(ApiError::NotAuthenticated);
        }
    };

    let profile = match user {
        Some(user) => state.backend.profile_of_user(user)?.map(|profile| profile.id),
        None => None,
    };

    request
        .extensions_mut()
        .insert(Actor { user, profile, admin });
    Ok(next.run(request).await)
}

async fn unknown_route() -> ApiError {
    ApiError::NotFound("Route")
}

#[derive(Debug, Default, Deserialize)]
struct ProfileQuery {
    nickname: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MeetingQuery {
    code: Option<String>,
    page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NameQuery {
    name: Option<String>,
    meeting_id: Option<String>,
}

async fn create_profile<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<ProfileRequest>, JsonRejection>,
) -> Reply<Profile> {
    let Json(request) = body?;
    let profile = profiles::create_profile(&state.backend, &actor, request)?;
    Ok(Envelope::created(profile).with_message("Profile created"))
}

async fn find_profile<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ProfileQuery>,
) -> Reply<Profile> {
    let profile = profiles::find_profile(&state.backend, &actor, query.nickname.as_deref())?;
    Ok(Envelope::ok(profile).with_message("Profile found"))
}

async fn my_profile<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
) -> Reply<Profile> {
    let profile = profiles::my_profile(&state.backend, &actor)?;
    Ok(Envelope::ok(profile).with_message("Profile found"))
}

async fn update_profile<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<ProfileId>, PathRejection>,
    body: Result<Json<ProfileRequest>, JsonRejection>,
) -> Reply<Profile> {
    let Path(id) = path?;
    let Json(request) = body?;
    let profile = profiles::update_profile(&state.backend, &actor, id, request)?;
    Ok(Envelope::ok(profile).with_message("Profile updated"))
}

async fn list_schedules<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
) -> Reply<Vec<Schedule>> {
    Ok(Envelope::ok(schedules::list_schedules(&state.backend, &actor)?))
}

async fn create_schedule<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Reply<Schedule> {
    let Json(request) = body?;
    Ok(Envelope::created(schedules::create_schedule(
        &state.backend,
        &actor,
        request,
    )?))
}

async fn schedule<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<ScheduleId>, PathRejection>,
) -> Reply<Schedule> {
    let Path(id) = path?;
    Ok(Envelope::ok(schedules::schedule(&state.backend, &actor, id)?))
}

async fn update_schedule<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<ScheduleId>, PathRejection>,
    body: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Reply<Schedule> {
    let Path(id) = path?;
    let Json(request) = body?;
    Ok(Envelope::ok(schedules::update_schedule(
        &state.backend,
        &actor,
        id,
        request,
    )?))
}

async fn delete_schedule<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<ScheduleId>, PathRejection>,
) -> Reply<()> {
    let Path(id) = path?;
    schedules::delete_schedule(&state.backend, &actor, id)?;
    Ok(Envelope::message(StatusCode::OK, "Schedule deleted"))
}

async fn create_meeting<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<MeetingRequest>, JsonRejection>,
) -> Reply<Meeting> {
    let Json(request) = body?;
    let meeting = meetings::create_meeting(
        &state.backend,
        &actor,
        request,
        state.settings.utc_offset,
    )?;
    Ok(Envelope::created(meeting))
}

/// With `code` anyone gets the meeting's summary, otherwise the actor's
/// meetings are listed page by page.
async fn list_meetings<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<MeetingQuery>,
) -> Result<Response, ApiError> {
    if let Some(code) = query.code.as_deref().filter(|code| !code.is_empty()) {
        let summary = meetings::meeting_by_code(&state.backend, code)?;
        return Ok(Envelope::ok(summary).into_response());
    }

    let page: Page<MeetingTab> = meetings::list_meetings(
        &state.backend,
        &actor,
        query.page.as_deref(),
        state.settings.page_size,
        state.now(),
        state.settings.utc_offset,
    )?;
    Ok(Envelope::ok(page).into_response())
}

async fn meeting_detail<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<MeetingId>, PathRejection>,
) -> Reply<MeetingDetail> {
    let Path(id) = path?;
    Ok(Envelope::ok(meetings::meeting_detail(&state.backend, &actor, id)?))
}

async fn update_meeting<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<MeetingId>, PathRejection>,
    body: Result<Json<MeetingRequest>, JsonRejection>,
) -> Reply<Meeting> {
    let Path(id) = path?;
    let Json(request) = body?;
    let meeting = meetings::update_meeting(
        &state.backend,
        &actor,
        id,
        request,
        state.settings.utc_offset,
    )?;
    Ok(Envelope::ok(meeting))
}

async fn delete_meeting<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<MeetingId>, PathRejection>,
) -> Reply<()> {
    let Path(id) = path?;
    meetings::delete_meeting(&state.backend, &actor, id)?;
    Ok(Envelope::message(StatusCode::OK, "Meeting deleted"))
}

async fn invite_code<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<MeetingId>, PathRejection>,
) -> Reply<InviteCode> {
    let Path(id) = path?;
    Ok(Envelope::ok(meetings::invite_code(&state.backend, &actor, id)?))
}

async fn choosable_times<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<MeetingId>, PathRejection>,
) -> Reply<Vec<DayBucket>> {
    let Path(id) = path?;
    Ok(Envelope::ok(meetings::choosable_times(
        &state.backend,
        &actor,
        id,
    )?))
}

async fn confirm_times<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<MeetingId>, PathRejection>,
    body: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Reply<Vec<ConfirmedTime>> {
    let Path(id) = path?;
    let Json(request) = body?;
    let confirmed = meetings::confirm_times(
        &state.backend,
        &actor,
        id,
        request,
        state.settings.utc_offset,
    )?;
    Ok(Envelope::created(confirmed).with_message("Meeting times confirmed"))
}

async fn leave_meeting<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<MeetingId>, PathRejection>,
) -> Reply<()> {
    let Path(id) = path?;
    meetings::leave_meeting(&state.backend, &actor, id)?;
    Ok(Envelope::message(StatusCode::OK, "Left meeting"))
}

async fn join_meeting<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    body: Result<Json<JoinRequest>, JsonRejection>,
) -> Reply<Participant> {
    let Json(request) = body?;
    let participant = participants::join_meeting(&state.backend, &actor, request, state.now())?;
    Ok(Envelope::created(participant))
}

async fn check_name<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Query(query): Query<NameQuery>,
) -> Reply<()> {
    participants::check_name(
        &state.backend,
        query.name.as_deref(),
        query.meeting_id.as_deref(),
    )?;
    Ok(Envelope::message(StatusCode::OK, "Name is available"))
}

async fn remove_participant<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<ParticipantId>, PathRejection>,
) -> Reply<()> {
    let Path(id) = path?;
    participants::remove_participant(&state.backend, &actor, id)?;
    Ok(Envelope::message(StatusCode::OK, "Participant removed"))
}

async fn list_confirmed_times<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
) -> Reply<Vec<ConfirmedTimeView>> {
    Ok(Envelope::ok(confirmed_times::list_confirmed_times(
        &state.backend,
        &actor,
        state.wall_clock_now(),
    )?))
}

async fn confirmed_time<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<ConfirmedTimeId>, PathRejection>,
) -> Reply<ConfirmedTimeView> {
    let Path(id) = path?;
    Ok(Envelope::ok(confirmed_times::confirmed_time(
        &state.backend,
        &actor,
        id,
        state.wall_clock_now(),
    )?))
}

async fn update_confirmed_time<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<ConfirmedTimeId>, PathRejection>,
    body: Result<Json<ConfirmedTimePatch>, JsonRejection>,
) -> Reply<ConfirmedTimeView> {
    let Path(id) = path?;
    let Json(patch) = body?;
    Ok(Envelope::ok(confirmed_times::update_confirmed_time(
        &state.backend,
        &actor,
        id,
        patch,
        state.wall_clock_now(),
    )?))
}

async fn delete_confirmed_time<T: SchedulingBackend>(
    State(state): State<AppState<T>>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<ConfirmedTimeId>, PathRejection>,
) -> Reply<()> {
    let Path(id) = path?;
    confirmed_times::delete_confirmed_time(&state.backend, &actor, id, state.wall_clock_now())?;
    Ok(Envelope::message(StatusCode::OK, "Confirmed time deleted"))
}
