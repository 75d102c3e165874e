mod test_server;

#[allow(unused_imports)]
pub use test_server::{ADMIN_PASSWORD, ADMIN_USERNAME, TestServer, TestSession};
