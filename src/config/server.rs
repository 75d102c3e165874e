use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;

/// Language of user-visible messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    De,
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            other => Err(Error::Config(format!("unsupported locale '{other}'"))),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Locale::En => "en",
            Locale::De => "de",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Lifetime of a login session in seconds.
    pub session_ttl_secs: u64,
    pub locale: Locale,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tablekeep.db")
    }

    /// Rejects settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("data directory must not be empty".to_string()));
        }
        if self.session_ttl_secs == 0 {
            return Err(Error::Config(
                "session TTL must be at least one second".to_string(),
            ));
        }
        if i64::try_from(self.session_ttl_secs).is_err() {
            return Err(Error::Config("session TTL is too large".to_string()));
        }
        self.socket_addr()
            .map_err(|e| Error::Config(format!("invalid listen address: {e}")))?;
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            locale: Locale::En,
        }
    }
}
