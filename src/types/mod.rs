mod models;
mod namespace;
mod schema;

pub use models::*;
pub use namespace::*;
pub use schema::*;
