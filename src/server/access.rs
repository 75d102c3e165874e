use super::i18n::{Messages, Msg};
use super::validation::validate_table_name;
use crate::server::response::{ApiError, StoreResultExt};
use crate::store::Store;
use crate::types::{TableAccess, User, authorize_table};

/// Validates, authorizes and then checks existence of a requested table, in that order,
/// so a denied caller never learns whether the table exists.
pub fn require_table_access(
    store: &dyn Store,
    user: &User,
    table: &str,
    messages: Messages,
) -> Result<TableAccess, ApiError> {
    validate_table_name(table, messages)?;

    let recorded_owner = store
        .table_owner(table)
        .api_err("Failed to look up table owner")?;

    let Some(access) = authorize_table(table, user.id, user.role, recorded_owner) else {
        tracing::warn!(user_id = user.id, table, "Denied table access");
        return Err(ApiError::forbidden(messages.get(Msg::AccessDenied)));
    };

    if !store
        .table_exists(table)
        .api_err("Failed to check table existence")?
    {
        return Err(ApiError::not_found(
            messages.with_detail(Msg::TableNotFound, table),
        ));
    }

    Ok(access)
}
