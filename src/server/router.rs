use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post},
};

use super::i18n::Messages;
use super::{actions, pages, session};
use crate::auth::{PasswordHasher, TokenGenerator};
use crate::config::ServerConfig;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub messages: Messages,
    pub session_ttl_secs: u64,
    pub passwords: PasswordHasher,
    pub tokens: TokenGenerator,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: &ServerConfig) -> Self {
        Self {
            store,
            messages: Messages::new(config.locale),
            session_ttl_secs: config.session_ttl_secs,
            passwords: PasswordHasher::new(),
            tokens: TokenGenerator::new(),
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", get(session::login_page).post(session::login))
        .route("/logout", post(session::logout))
        .route("/", get(pages::show_page).post(actions::perform_action))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
