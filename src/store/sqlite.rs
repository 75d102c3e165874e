use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, Row as SqlRow, params, params_from_iter};
use serde_json::Value as JsonValue;

use super::Store;
use super::schema::{SCHEMA, SERVICE_TABLES};
use crate::engine::{CreateTablePlan, Statement, build_drop_table, quote_ident};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

const USER_COLUMNS: &str = "id, username, password, role, created_at";

fn user_from_row(row: &SqlRow<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    let created_at: Option<String> = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        // An unparseable role never grants more than a plain user.
        role: role.parse().unwrap_or_default(),
        created_at: created_at.as_deref().map_or_else(Utc::now, parse_datetime),
    })
}

const SESSION_COLUMNS: &str =
    "id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at";

fn session_from_row(row: &SqlRow<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        user_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: row
            .get::<_, Option<String>>(5)?
            .map(|s| parse_datetime(&s)),
        last_used_at: row
            .get::<_, Option<String>>(6)?
            .map(|s| parse_datetime(&s)),
    })
}

fn json_value(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        ValueRef::Text(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

fn table_exists_in(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, username: &str, password_hash: &str, role: Role) -> Result<User> {
        let conn = self.conn();
        let created_at = Utc::now();
        let result = conn.execute(
            "INSERT INTO users (username, password, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                username,
                password_hash,
                role.as_str(),
                format_datetime(&created_at)
            ],
        );

        match result {
            Ok(_) => Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role,
                created_at,
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn has_admin(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO sessions (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.token_hash,
                session.token_lookup,
                session.user_id,
                format_datetime(&session.created_at),
                session.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::SessionLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE token_lookup = ?1"),
            params![lookup],
            session_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_session_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Schema introspection

    fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND substr(name, 1, 7) != 'sqlite_'
             ORDER BY name",
        )?;

        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(names
            .into_iter()
            .filter(|name| !SERVICE_TABLES.contains(&name.as_str()))
            .collect())
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        table_exists_in(&self.conn(), name)
    }

    fn describe_table(&self, name: &str) -> Result<TableSchema> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
        )?;

        let columns = stmt
            .query_map(params![name], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    declared_type: row.get(1)?,
                    nullable: row.get::<_, i64>(2)? == 0,
                    default: row.get(3)?,
                    primary_key: row.get::<_, i64>(4)? > 0,
                    auto_increment: false,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(Error::NotFound);
        }

        // A lone INTEGER PRIMARY KEY aliases the rowid and is assigned automatically.
        let mut columns = columns;
        let pk_count = columns.iter().filter(|c| c.primary_key).count();
        if pk_count == 1 {
            for column in &mut columns {
                column.auto_increment =
                    column.primary_key && column.declared_type.eq_ignore_ascii_case("INTEGER");
            }
        }

        Ok(TableSchema {
            name: name.to_string(),
            columns,
        })
    }

    fn table_owner(&self, name: &str) -> Result<Option<i64>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT owner_id FROM table_owners WHERE table_name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }

    // Dynamic tables

    fn create_table(&self, plan: &CreateTablePlan) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if table_exists_in(&tx, &plan.table_name)? {
            return Err(Error::AlreadyExists);
        }

        let statement = plan.statement();
        tx.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
        tx.execute(
            "INSERT INTO table_owners (table_name, owner_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                plan.table_name,
                plan.owner_id,
                format_datetime(&Utc::now())
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn drop_table(&self, name: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        if !table_exists_in(&tx, name)? {
            return Err(Error::NotFound);
        }

        tx.execute(&build_drop_table(name).sql, [])?;
        tx.execute(
            "DELETE FROM table_owners WHERE table_name = ?1",
            params![name],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn query_rows(&self, statement: &Statement) -> Result<Vec<Row>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&statement.sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (i, name) in names.iter().enumerate() {
                record.insert(name.clone(), json_value(row.get_ref(i)?));
            }
            out.push(record);
        }
        Ok(out)
    }

    fn insert_row(&self, statement: &Statement) -> Result<i64> {
        let conn = self.conn();
        conn.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
        Ok(conn.last_insert_rowid())
    }

    fn execute(&self, statement: &Statement) -> Result<usize> {
        let rows = self
            .conn()
            .execute(&statement.sql, params_from_iter(statement.params.iter()))?;
        Ok(rows)
    }

    fn delete_user_cascade(&self, user_id: i64) -> Result<Vec<String>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1",
                params![user_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(Error::NotFound);
        }

        let prefix = Namespace::of(user_id).prefix();
        let mut tables = BTreeSet::new();
        {
            let mut stmt = tx.prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND substr(name, 1, ?2) = ?1",
            )?;
            for name in stmt.query_map(params![prefix, prefix.len()], |row| row.get::<_, String>(0))? {
                tables.insert(name?);
            }

            let mut stmt = tx.prepare("SELECT table_name FROM table_owners WHERE owner_id = ?1")?;
            for name in stmt.query_map(params![user_id], |row| row.get::<_, String>(0))? {
                tables.insert(name?);
            }
        }

        for table in &tables {
            tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])?;
            tx.execute(
                "DELETE FROM table_owners WHERE table_name = ?1",
                params![table],
            )?;
        }

        tx.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        tx.commit()?;

        Ok(tables.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ColumnSpec, FieldMap, build_insert, build_select_all, build_update};
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn plain_hash(raw: &str) -> Result<String> {
        Ok(format!("hashed:{raw}"))
    }

    fn create_notes(store: &SqliteStore, owner: i64) -> String {
        let plan = CreateTablePlan::new(
            Namespace::of(owner),
            "notes",
            &[
                ColumnSpec::new("title", "TEXT"),
                ColumnSpec::new("done", "BOOLEAN"),
            ],
        )
        .unwrap();
        store.create_table(&plan).unwrap();
        plan.table_name
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"sessions".to_string()));
        assert!(tables.contains(&"table_owners".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_temp, store) = test_store();
        store.create_user("admin", "h", Role::Admin).unwrap();
        store.initialize().unwrap();
        assert!(store.has_admin().unwrap());
    }

    #[test]
    fn test_user_crud() {
        let (_temp, store) = test_store();
        assert!(!store.has_admin().unwrap());

        let user = store.create_user("ada", "hash", Role::User).unwrap();
        let fetched = store.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched.username, "ada");
        assert_eq!(fetched.role, Role::User);

        let by_name = store.get_user_by_username("ada").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert!(!store.has_admin().unwrap());

        assert!(matches!(
            store.create_user("ada", "other", Role::Admin),
            Err(Error::AlreadyExists)
        ));
    }

    #[test]
    fn test_session_lookup_collision() {
        let (_temp, store) = test_store();
        let user = store.create_user("ada", "hash", Role::User).unwrap();

        let session = |id: &str| Session {
            id: id.to_string(),
            token_hash: "hash".to_string(),
            token_lookup: "abcd1234".to_string(),
            user_id: user.id,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };

        store.create_session(&session("s-1")).unwrap();
        assert!(matches!(
            store.create_session(&session("s-2")),
            Err(Error::SessionLookupCollision)
        ));

        store.update_session_last_used("s-1").unwrap();
        let fetched = store.get_session_by_lookup("abcd1234").unwrap().unwrap();
        assert!(fetched.last_used_at.is_some());

        assert!(store.delete_session("s-1").unwrap());
        assert!(store.get_session_by_lookup("abcd1234").unwrap().is_none());
    }

    #[test]
    fn test_create_table_records_owner() {
        let (_temp, store) = test_store();
        let user = store.create_user("ada", "hash", Role::User).unwrap();
        let table = create_notes(&store, user.id);

        assert_eq!(table, format!("u{}_notes", user.id));
        assert!(store.table_exists(&table).unwrap());
        assert_eq!(store.table_owner(&table).unwrap(), Some(user.id));
        assert_eq!(store.list_tables().unwrap(), vec![table.clone(), "users".to_string()]);

        let plan = CreateTablePlan::new(
            Namespace::of(user.id),
            "notes",
            &[ColumnSpec::new("title", "TEXT")],
        )
        .unwrap();
        assert!(matches!(store.create_table(&plan), Err(Error::AlreadyExists)));
    }

    #[test]
    fn test_describe_table() {
        let (_temp, store) = test_store();
        let user = store.create_user("ada", "hash", Role::User).unwrap();
        let table = create_notes(&store, user.id);

        let schema = store.describe_table(&table).unwrap();
        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "done"]);

        let id = schema.column("id").unwrap();
        assert!(id.primary_key);
        assert!(id.auto_increment);
        assert!(schema.column("done").unwrap().is_boolean());
        assert!(schema.column("title").unwrap().nullable);

        let users = store.describe_table("users").unwrap();
        assert!(!users.column("username").unwrap().nullable);
        assert_eq!(
            users.column("role").unwrap().default.as_deref(),
            Some("'user'")
        );

        assert!(matches!(
            store.describe_table("missing"),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_insert_update_and_read_back() {
        let (_temp, store) = test_store();
        let user = store.create_user("ada", "hash", Role::User).unwrap();
        let table = create_notes(&store, user.id);
        let schema = store.describe_table(&table).unwrap();

        let fields: FieldMap = [("title", "Buy milk"), ("done", "on")].into_iter().collect();
        let insert = build_insert(&schema, &fields, plain_hash).unwrap();
        let inserted_id = store.insert_row(&insert).unwrap();

        let rows = store.query_rows(&build_select_all(&schema)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Buy milk");
        assert_eq!(rows[0]["done"], 1);
        let id = rows[0]["id"].as_i64().unwrap();
        assert_eq!(id, inserted_id);

        let fields: FieldMap = [("title", "")].into_iter().collect();
        let update = build_update(&schema, &fields, id, plain_hash).unwrap();
        assert_eq!(store.execute(&update).unwrap(), 1);

        let rows = store.query_rows(&build_select_all(&schema)).unwrap();
        assert!(rows[0]["title"].is_null());
        assert_eq!(rows[0]["done"], 0);

        let missing = build_update(&schema, &fields, id + 100, plain_hash).unwrap();
        assert_eq!(store.execute(&missing).unwrap(), 0);
    }

    #[test]
    fn test_drop_table_removes_owner_record() {
        let (_temp, store) = test_store();
        let user = store.create_user("ada", "hash", Role::User).unwrap();
        let table = create_notes(&store, user.id);

        store.drop_table(&table).unwrap();
        assert!(!store.table_exists(&table).unwrap());
        assert_eq!(store.table_owner(&table).unwrap(), None);
        assert!(matches!(store.drop_table(&table), Err(Error::NotFound)));
    }

    #[test]
    fn test_delete_user_cascade() {
        let (_temp, store) = test_store();
        let doomed = store.create_user("doomed", "hash", Role::User).unwrap();
        let other = store.create_user("other", "hash", Role::User).unwrap();

        let doomed_notes = create_notes(&store, doomed.id);
        let other_notes = create_notes(&store, other.id);
        store
            .conn()
            .execute_batch(&format!("CREATE TABLE u{}_legacy (x TEXT)", doomed.id))
            .unwrap();
        store
            .create_session(&Session {
                id: "s-1".to_string(),
                token_hash: "hash".to_string(),
                token_lookup: "abcd1234".to_string(),
                user_id: doomed.id,
                created_at: Utc::now(),
                expires_at: None,
                last_used_at: None,
            })
            .unwrap();

        let dropped = store.delete_user_cascade(doomed.id).unwrap();
        assert_eq!(
            dropped,
            vec![format!("u{}_legacy", doomed.id), doomed_notes.clone()]
        );

        assert!(!store.table_exists(&doomed_notes).unwrap());
        assert!(store.table_exists(&other_notes).unwrap());
        assert!(store.get_user(doomed.id).unwrap().is_none());
        assert!(store.get_session_by_lookup("abcd1234").unwrap().is_none());
        assert_eq!(store.table_owner(&doomed_notes).unwrap(), None);
    }

    #[test]
    fn test_delete_user_cascade_missing_user() {
        let (_temp, store) = test_store();
        assert!(matches!(
            store.delete_user_cascade(42),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_delete_user_cascade_rolls_back_on_failure() {
        let (_temp, store) = test_store();
        let user = store.create_user("ada", "hash", Role::User).unwrap();
        let notes = create_notes(&store, user.id);
        store
            .conn()
            .execute_batch(
                "CREATE TRIGGER refuse_user_delete BEFORE DELETE ON users
                 BEGIN SELECT RAISE(ABORT, 'refused'); END;",
            )
            .unwrap();

        assert!(matches!(
            store.delete_user_cascade(user.id),
            Err(Error::Database(_))
        ));

        assert!(store.table_exists(&notes).unwrap());
        assert_eq!(store.table_owner(&notes).unwrap(), Some(user.id));
        assert!(store.get_user(user.id).unwrap().is_some());
        assert_eq!(store.list_tables().unwrap(), vec![notes, "users".to_string()]);
    }

    #[test]
    fn test_blob_and_real_values_serialize() {
        let (_temp, store) = test_store();
        store
            .conn()
            .execute_batch("CREATE TABLE u1_misc (b BLOB, r REAL); INSERT INTO u1_misc VALUES (x'0102', 1.5)")
            .unwrap();

        let rows = store
            .query_rows(&Statement {
                sql: "SELECT b, r FROM u1_misc".to_string(),
                params: Vec::new(),
            })
            .unwrap();
        assert_eq!(rows[0]["b"], "AQI=");
        assert_eq!(rows[0]["r"], 1.5);
    }
}
