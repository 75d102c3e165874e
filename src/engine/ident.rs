use crate::error::{Error, Result};

pub const MAX_NAME_LEN: usize = 64;

fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True iff `name` matches `^[a-zA-Z_][a-zA-Z0-9_]{0,63}$`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };
    name.len() <= MAX_NAME_LEN && !first.is_ascii_digit() && name.chars().all(is_valid_name_char)
}

/// Rejects anything that may not be placed in identifier position.
pub fn validate_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// Backtick-quotes an identifier, doubling embedded backticks.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
