use crate::{
    backend::{NewProfile, SchedulingBackend},
    error::ApiError,
    permissions::{may_access_profile, Action, Actor},
    types::{Profile, ProfileId, University},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

lazy_static! {
    /// Hangul, Latin letters, digits and `*`.
    pub static ref NICKNAME: Regex = Regex::new(r"^[ㄱ-ㅎ가-힣a-zA-Z0-9*]+$").unwrap();
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(length(min = 2, max = 10), regex(path = *NICKNAME))]
    pub nickname: String,
    #[validate(range(min = 1, max = 3))]
    pub gender: u8,
    #[validate(url)]
    pub profile_image: Option<String>,
    #[validate(nested)]
    pub university: Option<University>,
}

pub fn create_profile<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    request: ProfileRequest,
) -> Result<Profile, ApiError> {
    let user = actor.require_user()?;
    request.validate()?;

    if backend.profile_by_nickname(&request.nickname)?.is_some() {
        warn!(nickname = %request.nickname, "Nickname already in use");
        return Err(ApiError::NicknameConflict);
    }

    let profile = backend.insert_profile(NewProfile {
        user,
        nickname: request.nickname,
        gender: request.gender,
        profile_image: request.profile_image,
        university: request.university,
    })?;
    info!(id = profile.id, "Profile created");
    Ok(profile)
}

pub fn find_profile<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    nickname: Option<&str>,
) -> Result<Profile, ApiError> {
    actor.require_authenticated()?;
    let nickname = nickname.ok_or(ApiError::MissingParameter("nickname"))?;
    backend
        .profile_by_nickname(nickname)?
        .ok_or(ApiError::NotFound("Profile"))
}

pub fn my_profile<T: SchedulingBackend>(backend: &T, actor: &Actor) -> Result<Profile, ApiError> {
    let id = actor.require_profile()?;
    backend.profile(id)?.ok_or(ApiError::NotFound("Profile"))
}

/// Replaces every field. A missing university removes the stored one.
pub fn update_profile<T: SchedulingBackend>(
    backend: &T,
    actor: &Actor,
    id: ProfileId,
    request: ProfileRequest,
) -> Result<Profile, ApiError> {
    actor.require_authenticated()?;
    let profile = backend.profile(id)?.ok_or(ApiError::NotFound("Profile"))?;
    if !may_access_profile(actor, &profile, Action::Update) {
        return Err(ApiError::PermissionDenied);
    }
    request.validate()?;

    let updated = backend.update_profile(Profile {
        nickname: request.nickname,
        gender: request.gender,
        profile_image: request.profile_image,
        university: request.university,
        ..profile
    })?;
    info!(id, "Profile updated");
    Ok(updated)
}
