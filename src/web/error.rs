//! API error envelope shared by all handlers.
//!
//! Handlers return `Result<_, ApiError>`; the data layer returns
//! `anyhow::Result` and gets mapped here. Status codes come from typed domain
//! errors via downcasting, never from string matching.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;
use tracing::error;
use ts_rs::TS;

use crate::data::connections::ConnectionError;
use crate::data::reports::ReportError;
use crate::data::ships::ShipError;

/// Machine-readable error codes exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ApiErrorCode {
    NotFound,
    InvalidInput,
    Conflict,
    MessageLimitReached,
    LowQualityMessage,
    Internal,
}

impl ApiErrorCode {
    fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ApiErrorCode::Conflict => StatusCode::CONFLICT,
            ApiErrorCode::MessageLimitReached => StatusCode::CONFLICT,
            ApiErrorCode::LowQualityMessage => StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl Display) -> Self {
        Self::new(ApiErrorCode::NotFound, format!("{entity} '{id}' not found"))
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidInput, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Conflict, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.code.status(), body).into_response()
    }
}

/// Map a data-layer error to an `ApiError`, downcasting known domain errors
/// to their status codes and logging everything else as internal.
pub fn db_error(context: &str, err: anyhow::Error) -> ApiError {
    if let Some(e) = err.downcast_ref::<ConnectionError>() {
        return match e {
            ConnectionError::NoSuchConnection => {
                ApiError::new(ApiErrorCode::NotFound, e.to_string())
            }
            ConnectionError::AlreadyExists => ApiError::conflict(e.to_string()),
        };
    }
    if let Some(e) = err.downcast_ref::<ShipError>() {
        return match e {
            ShipError::NoSuchShip => ApiError::new(ApiErrorCode::NotFound, e.to_string()),
            ShipError::AlreadyShipped => ApiError::conflict(e.to_string()),
        };
    }
    if let Some(e) = err.downcast_ref::<ReportError>() {
        return match e {
            ReportError::AlreadyReported => ApiError::conflict(e.to_string()),
        };
    }

    error!(error = ?err, context, "database operation failed");
    ApiError::new(ApiErrorCode::Internal, format!("{context} failed"))
}

/// `Option -> 404` sugar for handlers.
pub trait OptionNotFoundExt<T> {
    fn or_not_found(self, entity: &str, id: impl Display) -> Result<T, ApiError>;
}

impl<T> OptionNotFoundExt<T> for Option<T> {
    fn or_not_found(self, entity: &str, id: impl Display) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(entity, id))
    }
}
