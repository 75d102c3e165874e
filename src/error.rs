use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("already exists")]
    AlreadyExists,

    #[error("session lookup collision")]
    SessionLookupCollision,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid session token format")]
    InvalidTokenFormat,

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid column type: {0}")]
    InvalidColumnType(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("no valid columns")]
    NoColumns,

    #[error("no data submitted")]
    NoData,

    #[error("cannot delete the current user")]
    SelfDeletion,

    #[error("password is required")]
    PasswordRequired,

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("hashing failed: {0}")]
    Hash(String),
}

pub type Result<T> = std::result::Result<T, Error>;
