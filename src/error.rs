use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

/// Failures raised by the backing stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors surfaced at the handler boundary.
///
/// Every variant maps to a stable `kind` string and an HTTP status. Server-side
/// variants keep their cause for logging only; the response carries a generic
/// message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("user with the same email already exists")]
    DuplicateEmail,
    #[error("user with this email does not exist")]
    UnknownAccount,
    #[error("incorrect password")]
    WrongPassword,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    InvalidInput(String),
    #[error("request body is too large")]
    PayloadTooLarge,
    #[error("persistence error: {0}")]
    Persistence(anyhow::Error),
    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Unauthenticated",
            Self::DuplicateEmail => "DuplicateEmail",
            Self::UnknownAccount => "UnknownAccount",
            Self::WrongPassword => "WrongPassword",
            Self::NotFound(_) => "NotFound",
            Self::InvalidInput(_) => "InvalidInput",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::Persistence(_) => "PersistenceError",
            Self::Internal(_) => "InternalError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::DuplicateEmail
            | Self::UnknownAccount
            | Self::WrongPassword
            | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal(e: impl Into<anyhow::Error>) -> Self {
        Self::Internal(e.into())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::Database(e) => Self::Persistence(e.into()),
            StoreError::Other(e) => Self::Persistence(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "json body rejected");
        let message = match rejection {
            JsonRejection::JsonDataError(_) => "Request body is missing fields or has invalid values",
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
            _ => "Could not read request body",
        };
        Self::InvalidInput(message.into())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        debug!(error = %rejection.body_text(), "multipart body rejected");
        Self::InvalidInput("Expected a multipart/form-data body".into())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        let status = e.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else if status.is_server_error() {
            Self::internal(e)
        } else {
            debug!(error = %e, "malformed multipart body");
            Self::InvalidInput("Malformed multipart body".into())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Persistence(cause) => {
                error!(error = %cause, "store failure");
                "Could not complete the request, try again later".to_string()
            }
            Self::Internal(cause) => {
                error!(error = %cause, "internal failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            kind: self.kind(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
