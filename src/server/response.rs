use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use super::i18n::{Messages, Msg};
use crate::error::{Error, Result as StoreResult};

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Maps a domain error to a status and a localized message.
    #[must_use]
    pub fn from_error(err: Error, messages: Messages) -> Self {
        match err {
            Error::NotFound => Self::not_found(messages.get(Msg::EntryNotFound)),
            Error::AlreadyExists => Self::conflict(messages.get(Msg::TableExists)),
            Error::InvalidName(name) => {
                Self::bad_request(messages.with_detail(Msg::InvalidColumnName, &name))
            }
            Error::InvalidColumnType(ty) => {
                Self::bad_request(messages.with_detail(Msg::InvalidColumnType, &ty))
            }
            Error::DuplicateColumn(name) => {
                Self::bad_request(messages.with_detail(Msg::DuplicateColumn, &name))
            }
            Error::NoColumns => Self::bad_request(messages.get(Msg::NoColumns)),
            Error::NoData => Self::bad_request(messages.get(Msg::NoData)),
            Error::PasswordRequired => Self::bad_request(messages.get(Msg::PasswordRequired)),
            Error::InvalidRole(_) => Self::bad_request(messages.get(Msg::InvalidRole)),
            Error::SelfDeletion => Self::forbidden(messages.get(Msg::SelfDeletion)),
            Error::InvalidTokenFormat => {
                Self::unauthorized(messages.get(Msg::InvalidSession))
            }
            Error::Database(rusqlite::Error::SqliteFailure(e, detail))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                tracing::warn!(
                    "Constraint violation: {}",
                    detail.as_deref().unwrap_or("unknown")
                );
                Self::bad_request(messages.get(Msg::ConstraintViolation))
            }
            other => {
                tracing::error!("Store error: {other}");
                Self::internal(messages.get(Msg::Internal))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Extension trait for converting store results to API errors with a custom message.
pub trait StoreResultExt<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError>;
    fn or_api_error(self, messages: Messages) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn api_err(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!("{message}: {e}");
            ApiError::internal(message)
        })
    }

    fn or_api_error(self, messages: Messages) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::from_error(e, messages))
    }
}
