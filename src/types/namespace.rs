use std::fmt;

use super::Role;

/// Name of the shared account table. Only administrators may open it.
pub const USERS_TABLE: &str = "users";

/// The table namespace of a single user: every table it owns is named `u<id>_<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    owner_id: i64,
}

impl Namespace {
    #[must_use]
    pub const fn of(owner_id: i64) -> Self {
        Self { owner_id }
    }

    #[must_use]
    pub const fn owner_id(self) -> i64 {
        self.owner_id
    }

    #[must_use]
    pub fn prefix(self) -> String {
        format!("u{}_", self.owner_id)
    }

    /// Builds the stored table name for an unqualified, user-supplied name.
    #[must_use]
    pub fn qualify(self, name: &str) -> String {
        format!("{}{name}", self.prefix())
    }

    #[must_use]
    pub fn contains(self, table_name: &str) -> bool {
        table_name.starts_with(&self.prefix())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}_", self.owner_id)
    }
}

/// Why access to a table was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAccess {
    /// The table lives in the caller's own namespace.
    Owner,
    /// The caller is an administrator opening the shared `users` table.
    AccountAdmin,
}

/// Decides whether a session may touch `table_name`.
///
/// `recorded_owner` is the owner stored in the ownership registry, if the table
/// has an entry there. A registry entry that disagrees with the caller denies
/// access even when the name carries the caller's prefix.
#[must_use]
pub fn authorize_table(
    table_name: &str,
    user_id: i64,
    role: Role,
    recorded_owner: Option<i64>,
) -> Option<TableAccess> {
    if table_name == USERS_TABLE {
        return role.is_admin().then_some(TableAccess::AccountAdmin);
    }

    if !Namespace::of(user_id).contains(table_name) {
        return None;
    }

    match recorded_owner {
        Some(owner) if owner != user_id => None,
        _ => Some(TableAccess::Owner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_qualify() {
        let ns = Namespace::of(7);
        assert_eq!(ns.prefix(), "u7_");
        assert_eq!(ns.qualify("notes"), "u7_notes");
        assert_eq!(ns.to_string(), "u7_");
    }

    #[test]
    fn test_contains_does_not_confuse_ids() {
        let ns = Namespace::of(1);
        assert!(ns.contains("u1_notes"));
        assert!(!ns.contains("u12_notes"));
        assert!(!ns.contains("u1notes"));
    }

    #[test]
    fn test_foreign_namespace_denied_for_any_role() {
        assert_eq!(authorize_table("u7_notes", 3, Role::User, None), None);
        assert_eq!(authorize_table("u7_notes", 3, Role::Admin, None), None);
        assert_eq!(authorize_table("u7_notes", 3, Role::Admin, Some(7)), None);
    }

    #[test]
    fn test_own_namespace_granted() {
        assert_eq!(
            authorize_table("u3_notes", 3, Role::User, None),
            Some(TableAccess::Owner)
        );
        assert_eq!(
            authorize_table("u3_notes", 3, Role::User, Some(3)),
            Some(TableAccess::Owner)
        );
    }

    #[test]
    fn test_registry_overrides_prefix() {
        assert_eq!(authorize_table("u3_notes", 3, Role::User, Some(9)), None);
    }

    #[test]
    fn test_users_table_admin_only() {
        assert_eq!(
            authorize_table("users", 1, Role::Admin, None),
            Some(TableAccess::AccountAdmin)
        );
        assert_eq!(authorize_table("users", 1, Role::User, None), None);
    }

    #[test]
    fn test_service_tables_never_granted() {
        for name in ["sessions", "table_owners", "sqlite_sequence", "Users"] {
            assert_eq!(authorize_table(name, 1, Role::Admin, None), None);
        }
    }
}
