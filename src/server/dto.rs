use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ColumnInfo, InputKind, Role, Row, User};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default, alias = "table_name")]
    pub table: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: SessionUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub logged_in: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub user: SessionUser,
    pub tables: Vec<String>,
    pub column_types: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ColumnView {
    #[serde(flatten)]
    pub info: ColumnInfo,
    pub input: InputKind,
}

impl From<ColumnInfo> for ColumnView {
    fn from(info: ColumnInfo) -> Self {
        Self {
            input: info.input_kind(),
            info,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TablePage {
    pub user: SessionUser,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Row>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ActionResult {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_tables: Vec<String>,
}

impl ActionResult {
    #[must_use]
    pub fn new(message: &'static str, table: impl Into<String>) -> Self {
        Self {
            message,
            table: Some(table.into()),
            id: None,
            dropped_tables: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}
