mod access;
mod actions;
pub mod dto;
pub mod form;
pub mod i18n;
mod pages;
pub mod response;
mod router;
mod session;
pub mod validation;

pub use router::{AppState, create_router};
