pub const SCHEMA: &str = r#"
-- Accounts. Also exposed to administrators through the table editor.
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,             -- argon2id PHC string
    role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);

-- Login sessions; the raw token only lives in the client cookie
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,           -- argon2id hash with embedded salt
    token_lookup TEXT NOT NULL,         -- lookup part of the token for fast lookup
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,                    -- NULL = never
    last_used_at TEXT
);

-- Explicit ownership of namespaced tables
CREATE TABLE IF NOT EXISTS table_owners (
    table_name TEXT PRIMARY KEY,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_lookup ON sessions(token_lookup);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_table_owners_owner ON table_owners(owner_id);
"#;

/// Tables the service manages itself. Never listed, never editable.
pub const SERVICE_TABLES: [&str; 2] = ["sessions", "table_owners"];
