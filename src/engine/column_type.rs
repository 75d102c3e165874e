use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// Column types a user may pick when creating a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Text,
    Integer,
    Date,
    Boolean,
    Varchar,
    Decimal,
    Timestamp,
}

impl ColumnType {
    pub const ALL: [ColumnType; 7] = [
        ColumnType::Varchar,
        ColumnType::Integer,
        ColumnType::Text,
        ColumnType::Date,
        ColumnType::Timestamp,
        ColumnType::Decimal,
        ColumnType::Boolean,
    ];

    /// Declared type written into `CREATE TABLE`.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INT",
            ColumnType::Date => "DATE",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Varchar => "VARCHAR(255)",
            ColumnType::Decimal => "DECIMAL(10,2)",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "TEXT" => Ok(ColumnType::Text),
            "INT" | "INTEGER" => Ok(ColumnType::Integer),
            "DATE" => Ok(ColumnType::Date),
            "BOOLEAN" | "BOOL" => Ok(ColumnType::Boolean),
            "VARCHAR(255)" => Ok(ColumnType::Varchar),
            "DECIMAL(10,2)" => Ok(ColumnType::Decimal),
            "TIMESTAMP" => Ok(ColumnType::Timestamp),
            _ => Err(Error::InvalidColumnType(s.to_string())),
        }
    }
}
