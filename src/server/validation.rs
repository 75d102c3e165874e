use super::i18n::{Messages, Msg};
use crate::engine::is_valid_name;
use crate::server::response::ApiError;

/// Table names from the request must be plain identifiers before anything else looks at them.
pub fn validate_table_name(name: &str, messages: Messages) -> Result<(), ApiError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            messages.with_detail(Msg::InvalidTableName, name),
        ))
    }
}

/// Parses the row id of an entry action. Missing, blank or non-numeric ids are rejected.
pub fn parse_row_id(raw: Option<&str>, messages: Messages) -> Result<i64, ApiError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ApiError::bad_request(messages.get(Msg::MissingEntryId)))
}
