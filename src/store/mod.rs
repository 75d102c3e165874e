mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::engine::{CreateTablePlan, Statement};
use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, username: &str, password_hash: &str, role: Role) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn has_admin(&self) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn update_session_last_used(&self, id: &str) -> Result<()>;

    // Schema introspection
    fn list_tables(&self) -> Result<Vec<String>>;
    fn table_exists(&self, name: &str) -> Result<bool>;
    fn describe_table(&self, name: &str) -> Result<TableSchema>;
    fn table_owner(&self, name: &str) -> Result<Option<i64>>;

    // Dynamic tables
    /// Creates the table and records its owner atomically.
    fn create_table(&self, plan: &CreateTablePlan) -> Result<()>;
    /// Drops the table and its ownership record atomically.
    fn drop_table(&self, name: &str) -> Result<()>;
    fn query_rows(&self, statement: &Statement) -> Result<Vec<Row>>;
    /// Runs an `INSERT` and returns the rowid of the new row.
    fn insert_row(&self, statement: &Statement) -> Result<i64>;
    /// Runs a write statement and returns the number of affected rows.
    fn execute(&self, statement: &Statement) -> Result<usize>;

    /// Drops every table in the user's namespace, then deletes the `users` row,
    /// all in one transaction. Returns the dropped table names.
    fn delete_user_cascade(&self, user_id: i64) -> Result<Vec<String>>;
}
