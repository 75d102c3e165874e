use serde::Serialize;

/// A row read back from a table, keyed by column name in declaration order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Form control a column is edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
    Text,
    Number,
    Date,
    DatetimeLocal,
    Checkbox,
}

/// Introspected metadata of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub primary_key: bool,
    pub auto_increment: bool,
}

impl ColumnInfo {
    /// Checkbox columns: any declared type mentioning BOOL, or MySQL's TINYINT(1).
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        let ty = self.declared_type.to_ascii_uppercase();
        ty.contains("BOOL") || ty == "TINYINT(1)"
    }

    #[must_use]
    pub fn is_id(&self) -> bool {
        self.name.eq_ignore_ascii_case("id")
    }

    #[must_use]
    pub fn input_kind(&self) -> InputKind {
        let ty = self.declared_type.to_ascii_uppercase();
        if self.is_boolean() {
            InputKind::Checkbox
        } else if ty.contains("DATETIME") || ty.contains("TIMESTAMP") {
            InputKind::DatetimeLocal
        } else if ty.contains("DATE") {
            InputKind::Date
        } else if ["INT", "DECIMAL", "NUMERIC", "REAL", "FLOAT", "DOUBLE"]
            .iter()
            .any(|n| ty.contains(n))
        {
            InputKind::Number
        } else {
            InputKind::Text
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn has_id(&self) -> bool {
        self.columns.iter().any(ColumnInfo::is_id)
    }
}
