use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

use crate::models::workflow::TransitionError;
use crate::remote::BackendError;

#[derive(Debug)]
pub enum AppError {
    Transition(TransitionError),
    Backend(BackendError),
    Session(String),
    PermissionDenied(String),
    BadRequest(String),
    NotFound,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Transition(e) => write!(f, "{e}"),
            AppError::Backend(e) => write!(f, "{}", e.user_message()),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::PermissionDenied(code) => write!(f, "Permission denied: {code}"),
            AppError::BadRequest(e) => write!(f, "{e}"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Transition(e) => match e {
                TransitionError::Validation(_) | TransitionError::MissingOriginator => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                TransitionError::UploadFailure(_) | TransitionError::SubmissionFailure { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                TransitionError::Network { .. } => StatusCode::SERVICE_UNAVAILABLE,
                TransitionError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            },
            AppError::Backend(BackendError::Status { status: 404, .. }) => StatusCode::NOT_FOUND,
            AppError::Backend(BackendError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::Session(_) => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        }
        let body = match self {
            AppError::Transition(e) => serde_json::json!({
                "error": e.to_string(),
                "code": e.code(),
                "retryable": e.is_retryable(),
                "attachment": e.attachment(),
            }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };
        HttpResponse::build(status).json(body)
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::Transition(e)
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        AppError::Backend(e)
    }
}

impl From<actix_session::SessionInsertError> for AppError {
    fn from(e: actix_session::SessionInsertError) -> Self {
        AppError::Session(e.to_string())
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(e: base64::DecodeError) -> Self {
        AppError::BadRequest(format!("Attachment is not valid base64: {e}"))
    }
}
