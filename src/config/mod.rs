mod server;

pub use server::{Locale, ServerConfig};
