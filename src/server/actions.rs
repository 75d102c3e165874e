use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{Query, State},
};

use super::access::require_table_access;
use super::dto::{ActionResult, PageQuery};
use super::form::{Action, Submission};
use super::i18n::{Messages, Msg};
use super::validation::parse_row_id;
use crate::auth::RequireSession;
use crate::engine::{CreateTablePlan, build_delete, build_insert, build_update};
use crate::error::Error;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::types::{Namespace, USERS_TABLE, User};

type ActionResponse = Result<Json<ApiResponse<ActionResult>>, ApiError>;

pub async fn perform_action(
    auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> ActionResponse {
    let submission = Submission::parse(pairs);
    let messages = state.messages;
    let user = &auth.user;

    let Some(action) = submission.action() else {
        return Err(ApiError::bad_request(messages.get(Msg::UnknownAction)));
    };

    if action == Action::CreateTable {
        return create_table(&state, user, &submission);
    }

    let table = query
        .table
        .or_else(|| submission.table.clone())
        .or_else(|| submission.table_name.clone())
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    let raw_id = query.id.as_deref().or(submission.id.as_deref());

    require_table_access(state.store.as_ref(), user, &table, messages)?;

    match action {
        Action::CreateTable => Err(ApiError::bad_request(messages.get(Msg::UnknownAction))),
        Action::DeleteTable => delete_table(&state, user, &table),
        Action::AddEntry => add_entry(&state, &table, &submission),
        Action::UpdateEntry => update_entry(&state, &table, raw_id, &submission),
        Action::DeleteEntry => delete_entry(&state, user, &table, raw_id),
    }
}

fn create_table(state: &AppState, user: &User, submission: &Submission) -> ActionResponse {
    let messages = state.messages;
    let name = submission.table_name.as_deref().unwrap_or_default().trim();
    let namespace = Namespace::of(user.id);

    let plan = CreateTablePlan::new(namespace, name, &submission.columns)
        .map_err(|e| creation_error(e, name, namespace, messages))?;

    state
        .store
        .create_table(&plan)
        .map_err(|e| ApiError::from_error(e, messages))?;

    tracing::info!(
        user_id = user.id,
        table = %plan.table_name,
        columns = plan.columns.len(),
        "Created table"
    );

    Ok(Json(ApiResponse::success(ActionResult::new(
        messages.get(Msg::TableCreated),
        plan.table_name,
    ))))
}

/// Distinguishes a bad table name from a bad column name.
fn creation_error(err: Error, name: &str, namespace: Namespace, messages: Messages) -> ApiError {
    match err {
        Error::InvalidName(invalid) if invalid == name || invalid == namespace.qualify(name) => {
            ApiError::bad_request(messages.with_detail(Msg::InvalidTableName, &invalid))
        }
        other => ApiError::from_error(other, messages),
    }
}

fn delete_table(state: &AppState, user: &User, table: &str) -> ActionResponse {
    let messages = state.messages;

    if table == USERS_TABLE {
        return Err(ApiError::forbidden(messages.get(Msg::UsersTableProtected)));
    }

    state.store.drop_table(table).or_api_error(messages)?;
    tracing::info!(user_id = user.id, table, "Dropped table");

    Ok(Json(ApiResponse::success(ActionResult::new(
        messages.get(Msg::TableDeleted),
        table,
    ))))
}

fn add_entry(state: &AppState, table: &str, submission: &Submission) -> ActionResponse {
    let messages = state.messages;
    let schema = state.store.describe_table(table).or_api_error(messages)?;

    let statement = build_insert(&schema, &submission.data, |raw| state.passwords.hash(raw))
        .or_api_error(messages)?;
    let id = state.store.insert_row(&statement).or_api_error(messages)?;

    Ok(Json(ApiResponse::success(
        ActionResult::new(messages.get(Msg::EntryAdded), table).with_id(id),
    )))
}

fn update_entry(
    state: &AppState,
    table: &str,
    raw_id: Option<&str>,
    submission: &Submission,
) -> ActionResponse {
    let messages = state.messages;
    let id = parse_row_id(raw_id, messages)?;
    let schema = state.store.describe_table(table).or_api_error(messages)?;

    let statement = build_update(&schema, &submission.data, id, |raw| {
        state.passwords.hash(raw)
    })
    .or_api_error(messages)?;

    if state.store.execute(&statement).or_api_error(messages)? == 0 {
        return Err(ApiError::not_found(messages.get(Msg::EntryNotFound)));
    }

    Ok(Json(ApiResponse::success(
        ActionResult::new(messages.get(Msg::EntryUpdated), table).with_id(id),
    )))
}

fn delete_entry(
    state: &AppState,
    user: &User,
    table: &str,
    raw_id: Option<&str>,
) -> ActionResponse {
    let messages = state.messages;
    let id = parse_row_id(raw_id, messages)?;

    if table == USERS_TABLE {
        if id == user.id {
            tracing::warn!(user_id = user.id, "Refused self-deletion");
            return Err(ApiError::from_error(Error::SelfDeletion, messages));
        }

        let dropped = state
            .store
            .delete_user_cascade(id)
            .or_api_error(messages)?;
        tracing::info!(
            admin_id = user.id,
            deleted_user_id = id,
            dropped = ?dropped,
            "Deleted user and namespace"
        );

        let mut result = ActionResult::new(messages.get(Msg::EntryDeleted), table).with_id(id);
        result.dropped_tables = dropped;
        return Ok(Json(ApiResponse::success(result)));
    }

    if state
        .store
        .execute(&build_delete(table, id))
        .or_api_error(messages)?
        == 0
    {
        return Err(ApiError::not_found(messages.get(Msg::EntryNotFound)));
    }

    Ok(Json(ApiResponse::success(
        ActionResult::new(messages.get(Msg::EntryDeleted), table).with_id(id),
    )))
}
