use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::parse_token;
use crate::error::{Error, Result};
use crate::server::AppState;
use crate::types::{Session, User};

pub const SESSION_COOKIE: &str = "tablekeep_session";

const MAX_LOOKUP_ATTEMPTS: usize = 3;

#[derive(Debug)]
pub enum SessionValidationError {
    InvalidScheme,
    InvalidSession,
    SessionExpired,
    InternalError,
}

pub struct ValidatedSession {
    pub session: Session,
    pub user: User,
}

/// Finds a cookie value in a `Cookie` request header.
pub fn extract_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Extracts the session token from `Authorization: Bearer` or the session cookie.
/// Returns None if neither is present.
/// Returns Err if an Authorization header uses an unsupported scheme.
pub fn extract_session_token(
    headers: &HeaderMap,
) -> std::result::Result<Option<String>, SessionValidationError> {
    if let Some(header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        return match header.strip_prefix("Bearer ") {
            Some(token) => Ok(Some(token.trim().to_string())),
            None => Err(SessionValidationError::InvalidScheme),
        };
    }

    Ok(headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|h| extract_cookie(h, SESSION_COOKIE)))
}

/// Validates a raw session token against the store and loads the current user row.
pub fn validate_session(
    state: &AppState,
    raw_token: &str,
) -> std::result::Result<ValidatedSession, SessionValidationError> {
    let (lookup, _secret) =
        parse_token(raw_token).map_err(|_| SessionValidationError::InvalidSession)?;

    let session = state
        .store
        .get_session_by_lookup(&lookup)
        .map_err(|_| SessionValidationError::InternalError)?
        .ok_or(SessionValidationError::InvalidSession)?;

    if !state
        .tokens
        .verify(raw_token, &session.token_hash)
        .map_err(|_| SessionValidationError::InternalError)?
    {
        return Err(SessionValidationError::InvalidSession);
    }

    if session.is_expired(Utc::now()) {
        if let Err(e) = state.store.delete_session(&session.id) {
            tracing::warn!("Failed to delete expired session: {e}");
        }
        return Err(SessionValidationError::SessionExpired);
    }

    // Username and role always come from the live users row.
    let user = state
        .store
        .get_user(session.user_id)
        .map_err(|_| SessionValidationError::InternalError)?
        .ok_or(SessionValidationError::InvalidSession)?;

    if let Err(e) = state.store.update_session_last_used(&session.id) {
        tracing::warn!("Failed to update session last_used_at: {e}");
    }

    Ok(ValidatedSession { session, user })
}

/// Creates a session for `user`. Returns the raw token to hand to the client
/// together with the stored session.
pub fn start_session(state: &AppState, user: &User) -> Result<(String, Session)> {
    let ttl = i64::try_from(state.session_ttl_secs)
        .map_err(|_| Error::Config("session TTL is too large".to_string()))?;

    for _ in 0..MAX_LOOKUP_ATTEMPTS {
        let (raw_token, lookup, hash) = state.tokens.generate()?;
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            user_id: user.id,
            created_at: now,
            expires_at: Some(now + Duration::seconds(ttl)),
            last_used_at: None,
        };

        match state.store.create_session(&session) {
            Ok(()) => return Ok((raw_token, session)),
            Err(Error::SessionLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::SessionLookupCollision)
}

#[must_use]
pub fn session_cookie(raw_token: &str, max_age_secs: u64) -> String {
    format!("{SESSION_COOKIE}={raw_token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}")
}

#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}
