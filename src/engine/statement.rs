use rusqlite::types::Value;

use super::column_type::ColumnType;
use super::fields::{FieldMap, is_truthy};
use super::ident::{quote_ident, validate_name};
use crate::error::{Error, Result};
use crate::types::{ColumnInfo, Namespace, Role, TableSchema, USERS_TABLE};

const ID_COLUMN: &str = "id";
const PASSWORD_COLUMN: &str = "password";
const ROLE_COLUMN: &str = "role";

/// A parameterized SQL statement. Values are always bound, never interpolated.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }

    fn with_params(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }
}

/// Raw column definition as submitted by the create-table form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// A validated `CREATE TABLE` request for a user's namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTablePlan {
    pub table_name: String,
    pub owner_id: i64,
    pub columns: Vec<ColumnDef>,
}

impl CreateTablePlan {
    /// Validates the requested name and columns.
    ///
    /// Rows with a blank name or type are ignored. A column called `id` is dropped
    /// in favour of the injected primary key.
    pub fn new(namespace: Namespace, name: &str, specs: &[ColumnSpec]) -> Result<Self> {
        let name = name.trim();
        validate_name(name)?;

        let table_name = namespace.qualify(name);
        validate_name(&table_name)?;

        let mut columns: Vec<ColumnDef> = Vec::new();
        for spec in specs {
            let column_name = spec.name.trim();
            let column_type = spec.column_type.trim();
            if column_name.is_empty() || column_type.is_empty() {
                continue;
            }

            validate_name(column_name)?;
            let column_type: ColumnType = column_type.parse()?;

            if column_name.eq_ignore_ascii_case(ID_COLUMN) {
                continue;
            }
            if columns
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(column_name))
            {
                return Err(Error::DuplicateColumn(column_name.to_string()));
            }

            columns.push(ColumnDef {
                name: column_name.to_string(),
                column_type,
            });
        }

        if columns.is_empty() {
            return Err(Error::NoColumns);
        }

        Ok(Self {
            table_name,
            owner_id: namespace.owner_id(),
            columns,
        })
    }

    #[must_use]
    pub fn statement(&self) -> Statement {
        let mut defs = vec![format!(
            "{} INTEGER PRIMARY KEY AUTOINCREMENT",
            quote_ident(ID_COLUMN)
        )];
        defs.extend(
            self.columns
                .iter()
                .map(|c| format!("{} {}", quote_ident(&c.name), c.column_type.sql())),
        );

        Statement::new(format!(
            "CREATE TABLE {} ({})",
            quote_ident(&self.table_name),
            defs.join(", ")
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Insert,
    Update,
}

/// Turns one submitted field into the value to bind, or `None` to leave the column out.
fn coerce_field<H>(
    schema: &TableSchema,
    column: &ColumnInfo,
    raw: Option<&str>,
    mode: WriteMode,
    hash_password: &H,
) -> Result<Option<Value>>
where
    H: Fn(&str) -> Result<String>,
{
    let Some(raw) = raw else {
        // Unchecked checkboxes submit nothing.
        if mode == WriteMode::Update && column.is_boolean() {
            return Ok(Some(Value::Integer(0)));
        }
        return Ok(None);
    };

    if column.is_boolean() {
        return Ok(Some(Value::Integer(i64::from(is_truthy(raw)))));
    }

    let is_users = schema.name == USERS_TABLE;

    if is_users && column.name == PASSWORD_COLUMN {
        if raw.is_empty() {
            return match mode {
                WriteMode::Update => Ok(None),
                WriteMode::Insert => Err(Error::PasswordRequired),
            };
        }
        return Ok(Some(Value::Text(hash_password(raw)?)));
    }

    if is_users && column.name == ROLE_COLUMN && !raw.is_empty() {
        raw.parse::<Role>()
            .map_err(|_| Error::InvalidRole(raw.to_string()))?;
    }

    if raw.is_empty() {
        return Ok(match mode {
            WriteMode::Insert if column.default.is_some() => None,
            _ if column.nullable => Some(Value::Null),
            _ => None,
        });
    }

    Ok(Some(Value::Text(raw.to_string())))
}

/// Builds an `INSERT` from the submitted fields, covering only the columns present.
pub fn build_insert<H>(schema: &TableSchema, fields: &FieldMap, hash_password: H) -> Result<Statement>
where
    H: Fn(&str) -> Result<String>,
{
    let mut columns = Vec::new();
    let mut params = Vec::new();

    for column in &schema.columns {
        if column.is_id() {
            continue;
        }

        let raw = fields.get(&column.name);
        if column.auto_increment && raw.is_none_or(str::is_empty) {
            continue;
        }

        if let Some(value) = coerce_field(schema, column, raw, WriteMode::Insert, &hash_password)? {
            columns.push(quote_ident(&column.name));
            params.push(value);
        }
    }

    if columns.is_empty() {
        return Err(Error::NoData);
    }

    let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{i}")).collect();
    Ok(Statement::with_params(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&schema.name),
            columns.join(", "),
            placeholders.join(", ")
        ),
        params,
    ))
}

/// Builds an `UPDATE ... WHERE id = ?` for one row.
pub fn build_update<H>(
    schema: &TableSchema,
    fields: &FieldMap,
    row_id: i64,
    hash_password: H,
) -> Result<Statement>
where
    H: Fn(&str) -> Result<String>,
{
    let mut assignments = Vec::new();
    let mut params = Vec::new();

    for column in &schema.columns {
        if column.is_id() || column.auto_increment {
            continue;
        }

        let raw = fields.get(&column.name);
        if let Some(value) = coerce_field(schema, column, raw, WriteMode::Update, &hash_password)? {
            params.push(value);
            assignments.push(format!("{} = ?{}", quote_ident(&column.name), params.len()));
        }
    }

    if assignments.is_empty() {
        return Err(Error::NoData);
    }

    params.push(Value::Integer(row_id));
    Ok(Statement::with_params(
        format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(&schema.name),
            assignments.join(", "),
            quote_ident(ID_COLUMN),
            params.len()
        ),
        params,
    ))
}

#[must_use]
pub fn build_delete(table: &str, row_id: i64) -> Statement {
    Statement::with_params(
        format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(ID_COLUMN)
        ),
        vec![Value::Integer(row_id)],
    )
}

#[must_use]
pub fn build_select_all(schema: &TableSchema) -> Statement {
    let mut sql = format!("SELECT * FROM {}", quote_ident(&schema.name));
    if schema.has_id() {
        sql.push_str(&format!(" ORDER BY {}", quote_ident(ID_COLUMN)));
    }
    Statement::new(sql)
}

#[must_use]
pub fn build_select_one(table: &str, row_id: i64) -> Statement {
    Statement::with_params(
        format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(ID_COLUMN)
        ),
        vec![Value::Integer(row_id)],
    )
}

#[must_use]
pub fn build_drop_table(table: &str) -> Statement {
    Statement::new(format!("DROP TABLE {}", quote_ident(table)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, ty: &str, nullable: bool) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            declared_type: ty.to_string(),
            nullable,
            default: None,
            primary_key: false,
            auto_increment: false,
        }
    }

    fn id_column() -> ColumnInfo {
        ColumnInfo {
            primary_key: true,
            auto_increment: true,
            ..column("id", "INTEGER", false)
        }
    }

    fn notes_schema() -> TableSchema {
        TableSchema {
            name: "u7_notes".to_string(),
            columns: vec![
                id_column(),
                column("title", "TEXT", true),
                column("due", "DATE", true),
                column("done", "BOOLEAN", true),
            ],
        }
    }

    fn users_schema() -> TableSchema {
        TableSchema {
            name: "users".to_string(),
            columns: vec![
                id_column(),
                column("username", "TEXT", false),
                column("password", "TEXT", false),
                ColumnInfo {
                    default: Some("'user'".to_string()),
                    ..column("role", "TEXT", false)
                },
                ColumnInfo {
                    default: Some("CURRENT_TIMESTAMP".to_string()),
                    ..column("created_at", "TEXT", true)
                },
            ],
        }
    }

    fn fake_hash(raw: &str) -> Result<String> {
        Ok(format!("hashed:{raw}"))
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_create_table_plan_prefixes_and_injects_id() {
        let plan = CreateTablePlan::new(
            Namespace::of(7),
            "title",
            &[ColumnSpec::new("title", "TEXT")],
        )
        .unwrap();

        assert_eq!(plan.table_name, "u7_title");
        assert_eq!(plan.owner_id, 7);
        assert_eq!(
            plan.statement().sql,
            "CREATE TABLE `u7_title` (`id` INTEGER PRIMARY KEY AUTOINCREMENT, `title` TEXT)"
        );
    }

    #[test]
    fn test_create_table_plan_skips_blank_rows_and_id() {
        let plan = CreateTablePlan::new(
            Namespace::of(1),
            "tasks",
            &[
                ColumnSpec::new("ID", "INT"),
                ColumnSpec::new("", "TEXT"),
                ColumnSpec::new("label", ""),
                ColumnSpec::new("done", "boolean"),
            ],
        )
        .unwrap();

        assert_eq!(plan.columns.len(), 1);
        assert_eq!(plan.columns[0].name, "done");
        assert_eq!(plan.columns[0].column_type, ColumnType::Boolean);
    }

    #[test]
    fn test_create_table_plan_rejections() {
        let ns = Namespace::of(1);
        assert!(matches!(
            CreateTablePlan::new(ns, "bad name", &[ColumnSpec::new("a", "TEXT")]),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            CreateTablePlan::new(ns, "t", &[ColumnSpec::new("a;b", "TEXT")]),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            CreateTablePlan::new(ns, "t", &[ColumnSpec::new("a", "BLOB")]),
            Err(Error::InvalidColumnType(_))
        ));
        assert!(matches!(
            CreateTablePlan::new(
                ns,
                "t",
                &[ColumnSpec::new("a", "TEXT"), ColumnSpec::new("A", "INT")]
            ),
            Err(Error::DuplicateColumn(_))
        ));
        assert!(matches!(
            CreateTablePlan::new(ns, "t", &[ColumnSpec::new("id", "INT")]),
            Err(Error::NoColumns)
        ));
        assert!(matches!(
            CreateTablePlan::new(ns, "t", &[]),
            Err(Error::NoColumns)
        ));
    }

    #[test]
    fn test_create_table_plan_rejects_overlong_qualified_name() {
        let name = "n".repeat(62);
        assert!(matches!(
            CreateTablePlan::new(Namespace::of(12), &name, &[ColumnSpec::new("a", "TEXT")]),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn test_insert_only_supplied_columns() {
        let stmt = build_insert(&notes_schema(), &fields(&[("title", "Buy milk")]), fake_hash)
            .unwrap();

        assert_eq!(stmt.sql, "INSERT INTO `u7_notes` (`title`) VALUES (?1)");
        assert_eq!(stmt.params, vec![Value::Text("Buy milk".to_string())]);
    }

    #[test]
    fn test_insert_empty_nullable_becomes_null() {
        let stmt = build_insert(
            &notes_schema(),
            &fields(&[("title", ""), ("due", "2024-01-31")]),
            fake_hash,
        )
        .unwrap();

        assert_eq!(
            stmt.params,
            vec![Value::Null, Value::Text("2024-01-31".to_string())]
        );
    }

    #[test]
    fn test_insert_ignores_id_and_unknown_fields() {
        let stmt = build_insert(
            &notes_schema(),
            &fields(&[("id", "99"), ("title", "x"), ("nope`); DROP", "y")]),
            fake_hash,
        )
        .unwrap();

        assert_eq!(stmt.sql, "INSERT INTO `u7_notes` (`title`) VALUES (?1)");
    }

    #[test]
    fn test_insert_boolean_coercion() {
        let stmt = build_insert(&notes_schema(), &fields(&[("done", "on")]), fake_hash).unwrap();
        assert_eq!(stmt.params, vec![Value::Integer(1)]);

        let stmt = build_insert(&notes_schema(), &fields(&[("done", "0")]), fake_hash).unwrap();
        assert_eq!(stmt.params, vec![Value::Integer(0)]);
    }

    #[test]
    fn test_insert_nothing_is_no_data() {
        assert!(matches!(
            build_insert(&notes_schema(), &FieldMap::new(), fake_hash),
            Err(Error::NoData)
        ));
    }

    #[test]
    fn test_insert_users_hashes_password_and_keeps_defaults() {
        let stmt = build_insert(
            &users_schema(),
            &fields(&[
                ("username", "ada"),
                ("password", "s3cret"),
                ("role", ""),
                ("created_at", ""),
            ]),
            fake_hash,
        )
        .unwrap();

        assert_eq!(
            stmt.sql,
            "INSERT INTO `users` (`username`, `password`) VALUES (?1, ?2)"
        );
        assert_eq!(stmt.params[1], Value::Text("hashed:s3cret".to_string()));
    }

    #[test]
    fn test_insert_users_requires_password_and_valid_role() {
        assert!(matches!(
            build_insert(
                &users_schema(),
                &fields(&[("username", "ada"), ("password", "")]),
                fake_hash
            ),
            Err(Error::PasswordRequired)
        ));
        assert!(matches!(
            build_insert(
                &users_schema(),
                &fields(&[("username", "ada"), ("password", "pw"), ("role", "root")]),
                fake_hash
            ),
            Err(Error::InvalidRole(_))
        ));
    }

    #[test]
    fn test_update_unchecked_boolean_is_zero() {
        let stmt = build_update(&notes_schema(), &fields(&[("title", "x")]), 4, fake_hash).unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE `u7_notes` SET `title` = ?1, `done` = ?2 WHERE `id` = ?3"
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::Text("x".to_string()),
                Value::Integer(0),
                Value::Integer(4)
            ]
        );
    }

    #[test]
    fn test_update_never_sets_id() {
        let stmt = build_update(
            &notes_schema(),
            &fields(&[("id", "5"), ("done", "1")]),
            4,
            fake_hash,
        )
        .unwrap();
        assert_eq!(stmt.sql, "UPDATE `u7_notes` SET `done` = ?1 WHERE `id` = ?2");
    }

    #[test]
    fn test_update_empty_password_keeps_hash() {
        let stmt = build_update(
            &users_schema(),
            &fields(&[("username", "ada"), ("password", "")]),
            2,
            fake_hash,
        )
        .unwrap();

        assert_eq!(stmt.sql, "UPDATE `users` SET `username` = ?1 WHERE `id` = ?2");
    }

    #[test]
    fn test_update_new_password_is_hashed() {
        let stmt = build_update(&users_schema(), &fields(&[("password", "n3w")]), 2, fake_hash)
            .unwrap();

        assert_eq!(stmt.params[0], Value::Text("hashed:n3w".to_string()));
    }

    #[test]
    fn test_update_empty_non_nullable_left_unchanged() {
        let stmt = build_update(
            &users_schema(),
            &fields(&[("username", ""), ("created_at", "")]),
            2,
            fake_hash,
        )
        .unwrap();

        assert_eq!(stmt.sql, "UPDATE `users` SET `created_at` = ?1 WHERE `id` = ?2");
        assert_eq!(stmt.params, vec![Value::Null, Value::Integer(2)]);
    }

    #[test]
    fn test_update_nothing_is_no_data() {
        let schema = TableSchema {
            name: "u1_t".to_string(),
            columns: vec![id_column(), column("title", "TEXT", true)],
        };
        assert!(matches!(
            build_update(&schema, &FieldMap::new(), 1, fake_hash),
            Err(Error::NoData)
        ));
    }

    #[test]
    fn test_read_and_drop_statements_quote_names() {
        assert_eq!(
            build_select_all(&notes_schema()).sql,
            "SELECT * FROM `u7_notes` ORDER BY `id`"
        );
        assert_eq!(
            build_select_one("u7_notes", 3).sql,
            "SELECT * FROM `u7_notes` WHERE `id` = ?1"
        );
        assert_eq!(
            build_delete("u7_notes", 3).params,
            vec![Value::Integer(3)]
        );
        assert_eq!(build_drop_table("u7_notes").sql, "DROP TABLE `u7_notes`");
    }
}
