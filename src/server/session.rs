use std::sync::Arc;

use axum::{
    Form, Json,
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};

use super::dto::{LoginForm, LoginPage, LoginResponse, MessageResponse, SessionUser};
use super::i18n::Msg;
use crate::auth::{OptionalSession, RequireSession, clear_session_cookie, session_cookie, start_session};
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

pub async fn login_page(OptionalSession(session): OptionalSession) -> Response {
    if session.is_some() {
        return Redirect::to("/").into_response();
    }
    Json(ApiResponse::success(LoginPage { logged_in: false })).into_response()
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let messages = state.messages;
    let username = form.username.trim();

    if username.is_empty() || form.password.is_empty() {
        return Err(ApiError::bad_request(messages.get(Msg::CredentialsRequired)));
    }

    let user = state
        .store
        .get_user_by_username(username)
        .api_err("Failed to look up user")?;

    // Unknown user and wrong password must be indistinguishable.
    let user = user.filter(|user| {
        state
            .passwords
            .verify(&form.password, &user.password_hash)
            .unwrap_or_else(|e| {
                tracing::error!(user_id = user.id, "Stored password hash unusable: {e}");
                false
            })
    });

    let Some(user) = user else {
        tracing::warn!(username, "Failed login attempt");
        return Err(ApiError::unauthorized(messages.get(Msg::InvalidCredentials)));
    };

    let (token, session) = start_session(&state, &user).api_err("Failed to create session")?;
    tracing::info!(user_id = user.id, "User logged in");

    let body = LoginResponse {
        message: messages.get(Msg::LoggedIn),
        user: SessionUser::from(&user),
        token: token.clone(),
        expires_at: session.expires_at.unwrap_or(session.created_at),
    };

    Ok((
        [(SET_COOKIE, session_cookie(&token, state.session_ttl_secs))],
        Json(ApiResponse::success(body)),
    )
        .into_response())
}

pub async fn logout(
    auth: RequireSession,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    state
        .store
        .delete_session(&auth.session.id)
        .api_err("Failed to delete session")?;
    tracing::info!(user_id = auth.user.id, "User logged out");

    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        Json(ApiResponse::success(MessageResponse {
            message: state.messages.get(Msg::LoggedOut),
        })),
    )
        .into_response())
}
