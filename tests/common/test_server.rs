use std::sync::Arc;

use reqwest::{Client, StatusCode, redirect};
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use tablekeep::auth::PasswordHasher;
use tablekeep::config::{Locale, ServerConfig};
use tablekeep::server::{AppState, create_router};
use tablekeep::store::{SqliteStore, Store};
use tablekeep::types::Role;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub store: Arc<SqliteStore>,
    pub admin_id: i64,
    server_task: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_locale(Locale::En).await
    }

    pub async fn start_with_locale(locale: Locale) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            locale,
            ..ServerConfig::default()
        };

        let store = Arc::new(SqliteStore::new(config.db_path()).expect("open store"));
        store.initialize().expect("initialize store");

        let hash = PasswordHasher::new()
            .hash(ADMIN_PASSWORD)
            .expect("hash admin password");
        let admin = store
            .create_user(ADMIN_USERNAME, &hash, Role::Admin)
            .expect("create admin");

        let state = Arc::new(AppState::new(store.clone(), &config));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let server_task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url,
            store,
            admin_id: admin.id,
            server_task: Some(server_task),
        }
    }

    /// A client that does not follow redirects, so 303s can be asserted.
    pub fn client(&self) -> Client {
        Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .expect("build client")
    }

    pub fn create_user(&self, username: &str, password: &str, role: Role) -> i64 {
        let hash = PasswordHasher::new().hash(password).expect("hash password");
        self.store
            .create_user(username, &hash, role)
            .expect("create user")
            .id
    }

    pub async fn login(&self, username: &str, password: &str) -> TestSession {
        let resp = self
            .client()
            .post(format!("{}/login", self.base_url))
            .form(&[("login", "1"), ("username", username), ("password", password)])
            .send()
            .await
            .expect("login request");
        assert_eq!(resp.status(), StatusCode::OK, "login as {username}");

        let body: Value = resp.json().await.expect("parse login response");
        TestSession {
            client: self.client(),
            base_url: self.base_url.clone(),
            token: body["data"]["token"]
                .as_str()
                .expect("session token")
                .to_string(),
            user_id: body["data"]["user"]["id"].as_i64().expect("user id"),
        }
    }

    pub async fn login_admin(&self) -> TestSession {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.server_task.take() {
            task.abort();
        }
    }
}

pub struct TestSession {
    pub client: Client,
    pub base_url: String,
    pub token: String,
    pub user_id: i64,
}

impl TestSession {
    pub async fn page(&self, query: &[(&str, &str)]) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(format!("{}/", self.base_url))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .expect("page request");
        let status = resp.status();
        (status, resp.json().await.expect("parse page"))
    }

    pub async fn action(&self, query: &[(&str, &str)], form: &[(&str, &str)]) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}/", self.base_url))
            .bearer_auth(&self.token)
            .query(query)
            .form(form)
            .send()
            .await
            .expect("action request");
        let status = resp.status();
        (status, resp.json().await.expect("parse action"))
    }

    /// Creates `u<id>_<name>` with the given `(name, type)` columns.
    pub async fn create_table(&self, name: &str, columns: &[(&str, &str)]) -> (StatusCode, Value) {
        let mut form: Vec<(String, String)> = vec![
            ("create_table".into(), "1".into()),
            ("table_name".into(), name.into()),
        ];
        for (i, (column, ty)) in columns.iter().enumerate() {
            form.push((format!("columns[{i}][name]"), (*column).into()));
            form.push((format!("columns[{i}][type]"), (*ty).into()));
        }
        let form: Vec<(&str, &str)> = form.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        self.action(&[], &form).await
    }
}
