use crate::envelope::Envelope;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

/// Which ordering rule a start/end pair broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingRule {
    StartLaterThanEnd,
    StartEqualOrLaterThanEnd,
}

impl fmt::Display for OrderingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingRule::StartLaterThanEnd => write!(f, "Start is later than end"),
            OrderingRule::StartEqualOrLaterThanEnd => {
                write!(f, "Start is equal to or later than end")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("At least one time has to be given")]
    EmptyInput,

    #[error("{0}")]
    InvalidOrdering(OrderingRule),

    #[error("Time is not on the allowed grid")]
    OffGridTime,

    #[error("Available times do not fit the meeting")]
    OutOfWindow,

    #[error("Schedule times do not match the recurrence setting")]
    RecurrenceMismatch,

    #[error("A schedule already exists in the given time range")]
    ScheduleConflict,

    #[error("Participant name is already taken")]
    NameConflict,

    #[error("Nickname is already in use")]
    NicknameConflict,

    #[error("User already has a profile")]
    ProfileConflict,

    #[error("Invite code is not valid")]
    InvalidInviteCode,

    #[error("Authentication required")]
    NotAuthenticated,

    #[error("User was not invited")]
    NotParticipant,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("{0} does not exist")]
    NotFound(&'static str),

    #[error("Missing or invalid parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid input: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("Malformed request body: {0}")]
    Malformed(#[from] JsonRejection),

    #[error("Malformed path: {0}")]
    MalformedPath(#[from] PathRejection),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::EmptyInput
            | ApiError::InvalidOrdering(_)
            | ApiError::OffGridTime
            | ApiError::OutOfWindow
            | ApiError::RecurrenceMismatch
            | ApiError::Invalid(_)
            | ApiError::Malformed(_)
            | ApiError::MalformedPath(_) => StatusCode::BAD_REQUEST,
            ApiError::ScheduleConflict | ApiError::NameConflict | ApiError::NicknameConflict => {
                StatusCode::CONFLICT
            }
            ApiError::ProfileConflict | ApiError::MissingParameter(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::InvalidInviteCode | ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NotParticipant | ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(err = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        Envelope::<()>::failure(status, message).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_case::test_case(ApiError::EmptyInput, StatusCode::BAD_REQUEST)]
    #[test_case::test_case(ApiError::OffGridTime, StatusCode::BAD_REQUEST)]
    #[test_case::test_case(ApiError::ScheduleConflict, StatusCode::CONFLICT)]
    #[test_case::test_case(ApiError::NameConflict, StatusCode::CONFLICT)]
    #[test_case::test_case(ApiError::InvalidInviteCode, StatusCode::UNAUTHORIZED)]
    #[test_case::test_case(ApiError::NotParticipant, StatusCode::FORBIDDEN)]
    #[test_case::test_case(ApiError::NotFound("Meeting"), StatusCode::NOT_FOUND)]
    #[test_case::test_case(ApiError::MissingParameter("nickname"), StatusCode::UNPROCESSABLE_ENTITY)]
    #[test_case::test_case(ApiError::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn error_status(err: ApiError, status: StatusCode) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.into_response().status(), status);
    }

    #[test]
    fn ordering_messages_differ() {
        let later = ApiError::InvalidOrdering(OrderingRule::StartLaterThanEnd).to_string();
        let equal = ApiError::InvalidOrdering(OrderingRule::StartEqualOrLaterThanEnd).to_string();
        assert_eq!(later, "Start is later than end");
        assert_eq!(equal, "Start is equal to or later than end");
    }
}
