mod helpers;
mod middleware;
mod password;
mod token;

pub use helpers::{
    SESSION_COOKIE, ValidatedSession, clear_session_cookie, extract_cookie, session_cookie,
    start_session,
};
pub use middleware::{AuthError, OptionalSession, RequireSession};
pub use password::PasswordHasher;
pub use token::{TokenGenerator, parse_token};
