use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use super::access::require_table_access;
use super::dto::{ColumnView, IndexPage, PageQuery, SessionUser, TablePage};
use super::i18n::{Messages, Msg};
use super::validation::parse_row_id;
use crate::auth::RequireSession;
use crate::engine::{ColumnType, build_select_all, build_select_one};
use crate::error::Result as StoreResult;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};
use crate::store::Store;
use crate::types::{Row, TableSchema, USERS_TABLE, User, authorize_table};

const PASSWORD_COLUMN: &str = "password";

pub async fn show_page(
    auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiError> {
    let table = query
        .table
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    match table {
        Some(table) => table_page(&state, &auth.user, table, query.id.as_deref()),
        None => index_page(&state, &auth.user),
    }
}

fn index_page(state: &AppState, user: &User) -> Result<Response, ApiError> {
    let store = state.store.as_ref();
    let mut errors = Vec::new();

    let tables = match store.list_tables() {
        Ok(all) => visible_tables(
            all,
            user,
            |table| store.table_owner(table),
            state.messages,
            &mut errors,
        ),
        Err(e) => {
            tracing::error!("Failed to list tables: {e}");
            errors.push(state.messages.get(Msg::TablesUnavailable).to_string());
            Vec::new()
        }
    };

    let page = IndexPage {
        user: SessionUser::from(user),
        tables,
        column_types: ColumnType::ALL.iter().map(|t| t.sql()).collect(),
        errors,
    };

    Ok(Json(ApiResponse::success(page)).into_response())
}

/// Keeps the tables `user` may open. A table whose owner cannot be looked up is
/// left out and reported once, the rest of the list still renders.
fn visible_tables<F>(
    tables: Vec<String>,
    user: &User,
    table_owner: F,
    messages: Messages,
    errors: &mut Vec<String>,
) -> Vec<String>
where
    F: Fn(&str) -> StoreResult<Option<i64>>,
{
    let mut failed = false;
    let mut visible = Vec::with_capacity(tables.len());

    for table in tables {
        match table_owner(&table) {
            Ok(owner) => {
                if authorize_table(&table, user.id, user.role, owner).is_some() {
                    visible.push(table);
                }
            }
            Err(e) => {
                tracing::error!(table, "Failed to look up table owner: {e}");
                failed = true;
            }
        }
    }

    if failed {
        errors.push(messages.get(Msg::TablesUnavailable).to_string());
    }
    visible
}

fn table_page(
    state: &AppState,
    user: &User,
    table: &str,
    raw_id: Option<&str>,
) -> Result<Response, ApiError> {
    let store = state.store.as_ref();
    let messages = state.messages;

    require_table_access(store, user, table, messages)?;

    let mut errors = Vec::new();

    let schema = match store.describe_table(table) {
        Ok(schema) => Some(schema),
        Err(e) => {
            tracing::error!(table, "Failed to describe table: {e}");
            errors.push(messages.get(Msg::ColumnsUnavailable).to_string());
            None
        }
    };

    let rows = load_rows(store, table, schema.as_ref(), messages, &mut errors);

    let entry = raw_id.and_then(|raw| load_entry(store, table, raw, messages, &mut errors));

    let redact = table == USERS_TABLE;
    let page = TablePage {
        user: SessionUser::from(user),
        table: table.to_string(),
        columns: schema.map(|s| s.columns.into_iter().map(ColumnView::from).collect()),
        rows: rows.map(|rows| {
            rows.into_iter()
                .map(|row| redact_row(row, redact))
                .collect()
        }),
        entry: entry.map(|row| redact_row(row, redact)),
        errors,
    };

    Ok(Json(ApiResponse::success(page)).into_response())
}

fn load_rows(
    store: &dyn Store,
    table: &str,
    schema: Option<&TableSchema>,
    messages: Messages,
    errors: &mut Vec<String>,
) -> Option<Vec<Row>> {
    // Without column metadata the rows are still listed, just unordered.
    let fallback;
    let schema = match schema {
        Some(schema) => schema,
        None => {
            fallback = TableSchema {
                name: table.to_string(),
                columns: Vec::new(),
            };
            &fallback
        }
    };

    match store.query_rows(&build_select_all(schema)) {
        Ok(rows) => Some(rows),
        Err(e) => {
            tracing::error!(table, "Failed to read rows: {e}");
            errors.push(messages.get(Msg::RowsUnavailable).to_string());
            None
        }
    }
}

fn load_entry(
    store: &dyn Store,
    table: &str,
    raw_id: &str,
    messages: Messages,
    errors: &mut Vec<String>,
) -> Option<Row> {
    let id = match parse_row_id(Some(raw_id), messages) {
        Ok(id) => id,
        Err(e) => {
            errors.push(e.message);
            return None;
        }
    };

    match store.query_rows(&build_select_one(table, id)) {
        Ok(rows) => {
            let entry = rows.into_iter().next();
            if entry.is_none() {
                errors.push(messages.get(Msg::EntryNotFound).to_string());
            }
            entry
        }
        Err(e) => {
            tracing::error!(table, id, "Failed to read entry: {e}");
            errors.push(messages.get(Msg::EntryNotFound).to_string());
            None
        }
    }
}

/// Password hashes never leave the server.
fn redact_row(mut row: Row, redact: bool) -> Row {
    if redact {
        if let Some(value) = row.get_mut(PASSWORD_COLUMN) {
            *value = Value::Null;
        }
    }
    row
}
