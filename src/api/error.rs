//! JSON error responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{"error": ..., "code": ...}`
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: String,
}

/// Error returned by API handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                code: code.into(),
            },
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, "invalid_message")
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<helpdesk_core::Error> for ApiError {
    fn from(err: helpdesk_core::Error) -> Self {
        use helpdesk_core::Error;

        let status = match &err {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::DuplicateId(_) => StatusCode::CONFLICT,
            Error::InvalidMessage(_) => StatusCode::BAD_REQUEST,
            Error::NotConnected(_) | Error::AdapterUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string(), err.code())
    }
}

impl From<helpdesk_knowledge::Error> for ApiError {
    fn from(err: helpdesk_knowledge::Error) -> Self {
        use helpdesk_knowledge::Error;

        let status = match &err {
            Error::DuplicateQuestion(_) | Error::InvalidEntry(_) => StatusCode::BAD_REQUEST,
            Error::EntryNotFound(_) => StatusCode::NOT_FOUND,
            Error::Io(_) | Error::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string(), err.code())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
