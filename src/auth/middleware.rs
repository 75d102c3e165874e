use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;

use super::helpers::{
    SessionValidationError, ValidatedSession, clear_session_cookie, extract_session_token,
    validate_session,
};
use crate::server::AppState;
use crate::server::i18n::{Messages, Msg};
use crate::types::{Session, User};

/// Extractor that requires a valid login session.
pub struct RequireSession {
    pub session: Session,
    pub user: User,
}

/// Extractor for pages that work with or without a session.
pub struct OptionalSession(pub Option<ValidatedSession>);

#[derive(Debug)]
pub enum AuthError {
    /// No credentials at all; browsers are sent to the login page.
    MissingAuth,
    Unauthorized(&'static str),
    InternalError(&'static str),
}

impl AuthError {
    fn from_validation(e: SessionValidationError, messages: Messages) -> Self {
        match e {
            SessionValidationError::InvalidScheme | SessionValidationError::InvalidSession => {
                AuthError::Unauthorized(messages.get(Msg::InvalidSession))
            }
            SessionValidationError::SessionExpired => {
                AuthError::Unauthorized(messages.get(Msg::SessionExpired))
            }
            SessionValidationError::InternalError => {
                AuthError::InternalError(messages.get(Msg::Internal))
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => return Redirect::to("/login").into_response(),
            AuthError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            AuthError::InternalError(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"tablekeep\""),
            );
            // Drop a stale cookie so the browser stops presenting it.
            if let Ok(cookie) = HeaderValue::from_str(&clear_session_cookie()) {
                response.headers_mut().insert(header::SET_COOKIE, cookie);
            }
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw_token = extract_session_token(&parts.headers)
            .map_err(|e| AuthError::from_validation(e, state.messages))?
            .ok_or(AuthError::MissingAuth)?;

        let validated = validate_session(state, &raw_token)
            .map_err(|e| AuthError::from_validation(e, state.messages))?;

        Ok(RequireSession {
            session: validated.session,
            user: validated.user,
        })
    }
}

impl FromRequestParts<Arc<AppState>> for OptionalSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Ok(Some(raw_token)) = extract_session_token(&parts.headers) else {
            return Ok(OptionalSession(None));
        };

        match validate_session(state, &raw_token) {
            Ok(validated) => Ok(OptionalSession(Some(validated))),
            Err(SessionValidationError::InternalError) => {
                Err(AuthError::InternalError(state.messages.get(Msg::Internal)))
            }
            Err(_) => Ok(OptionalSession(None)),
        }
    }
}
