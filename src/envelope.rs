use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Body shape shared by every response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: u16,
    pub success: bool,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self::with_data(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::with_data(StatusCode::CREATED, data)
    }

    pub fn with_data(status: StatusCode, data: T) -> Self {
        Self {
            status: status.as_u16(),
            success: status.is_success(),
            message: None,
            data: Some(data),
        }
    }

    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            success: status.is_success(),
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self::message(status, message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn data_is_omitted_without_payload() {
        let body = serde_json::to_value(Envelope::<()>::message(StatusCode::CREATED, "done")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "status": 201, "success": true, "message": "done" })
        );
    }

    #[test]
    fn failure_is_not_successful() {
        let envelope = Envelope::<()>::failure(StatusCode::CONFLICT, "taken");
        assert!(!envelope.success);
        assert_eq!(envelope.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn payload_keeps_message_empty() {
        let body = serde_json::to_value(Envelope::ok(vec![1, 2])).unwrap();
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert!(body["message"].is_null());
    }
}
