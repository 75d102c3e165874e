use crate::config::Locale;

/// Keys of every user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    CredentialsRequired,
    InvalidCredentials,
    LoggedIn,
    LoggedOut,
    InvalidSession,
    SessionExpired,
    AccessDenied,
    TableNotFound,
    InvalidTableName,
    InvalidColumnName,
    InvalidColumnType,
    DuplicateColumn,
    NoColumns,
    TableExists,
    TableCreated,
    TableDeleted,
    UsersTableProtected,
    EntryAdded,
    EntryUpdated,
    EntryDeleted,
    EntryNotFound,
    NoData,
    MissingEntryId,
    SelfDeletion,
    PasswordRequired,
    InvalidRole,
    ConstraintViolation,
    UnknownAction,
    ColumnsUnavailable,
    RowsUnavailable,
    TablesUnavailable,
    Internal,
}

impl Msg {
    #[must_use]
    pub const fn text(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.en(),
            Locale::De => self.de(),
        }
    }

    const fn en(self) -> &'static str {
        match self {
            Msg::CredentialsRequired => "Username and password are required.",
            Msg::InvalidCredentials => "Invalid username or password.",
            Msg::LoggedIn => "Logged in.",
            Msg::LoggedOut => "Logged out.",
            Msg::InvalidSession => "Invalid session.",
            Msg::SessionExpired => "Session expired. Please log in again.",
            Msg::AccessDenied => "Access denied.",
            Msg::TableNotFound => "Table not found",
            Msg::InvalidTableName => {
                "Invalid table name. Use only letters, numbers, and underscores (max 64 chars)"
            }
            Msg::InvalidColumnName => {
                "Invalid column name. Use only letters, numbers, and underscores"
            }
            Msg::InvalidColumnType => "Invalid column type",
            Msg::DuplicateColumn => "Duplicate column",
            Msg::NoColumns => "No valid columns defined for the new table.",
            Msg::TableExists => "A table with this name already exists",
            Msg::TableCreated => "Table created successfully. Column 'id' was made the primary key.",
            Msg::TableDeleted => "Table deleted.",
            Msg::UsersTableProtected => "The users table cannot be deleted.",
            Msg::EntryAdded => "Entry added.",
            Msg::EntryUpdated => "Entry updated.",
            Msg::EntryDeleted => "Entry deleted.",
            Msg::EntryNotFound => "Entry not found.",
            Msg::NoData => "No data submitted.",
            Msg::MissingEntryId => "No entry id given.",
            Msg::SelfDeletion => "You cannot delete your own account.",
            Msg::PasswordRequired => "A password is required.",
            Msg::InvalidRole => "Role must be 'user' or 'admin'.",
            Msg::ConstraintViolation => "The entry violates a table constraint.",
            Msg::UnknownAction => "Unknown or missing action.",
            Msg::ColumnsUnavailable => "Error fetching table columns",
            Msg::RowsUnavailable => "Error fetching table data",
            Msg::TablesUnavailable => "Error fetching tables",
            Msg::Internal => "Database error",
        }
    }

    const fn de(self) -> &'static str {
        match self {
            Msg::CredentialsRequired => "Benutzername und Passwort sind erforderlich.",
            Msg::InvalidCredentials => "Ungültiger Benutzername oder Passwort.",
            Msg::LoggedIn => "Angemeldet.",
            Msg::LoggedOut => "Abgemeldet.",
            Msg::InvalidSession => "Ungültige Sitzung.",
            Msg::SessionExpired => "Sitzung abgelaufen. Bitte erneut anmelden.",
            Msg::AccessDenied => "Zugriff verweigert.",
            Msg::TableNotFound => "Tabelle nicht gefunden",
            Msg::InvalidTableName => {
                "Ungültiger Tabellenname. Nur Buchstaben, Ziffern und Unterstriche (max. 64 Zeichen)"
            }
            Msg::InvalidColumnName => {
                "Ungültiger Spaltenname. Nur Buchstaben, Ziffern und Unterstriche"
            }
            Msg::InvalidColumnType => "Ungültiger Spaltentyp",
            Msg::DuplicateColumn => "Doppelte Spalte",
            Msg::NoColumns => "Keine gültigen Spalten für die neue Tabelle angegeben.",
            Msg::TableExists => "Eine Tabelle mit diesem Namen existiert bereits",
            Msg::TableCreated => {
                "Tabelle erfolgreich erstellt. Die Spalte 'id' wurde zum Primärschlüssel."
            }
            Msg::TableDeleted => "Tabelle gelöscht.",
            Msg::UsersTableProtected => "Die Benutzertabelle kann nicht gelöscht werden.",
            Msg::EntryAdded => "Erfolg! Daten hinzugefügt.",
            Msg::EntryUpdated => "Eintrag erfolgreich aktualisiert.",
            Msg::EntryDeleted => "Eintrag gelöscht.",
            Msg::EntryNotFound => "Eintrag nicht gefunden.",
            Msg::NoData => "Keine Daten zum Aktualisieren vorhanden.",
            Msg::MissingEntryId => "Keine Eintrags-ID angegeben.",
            Msg::SelfDeletion => "Du kannst dein eigenes Konto nicht löschen.",
            Msg::PasswordRequired => "Ein Passwort ist erforderlich.",
            Msg::InvalidRole => "Die Rolle muss 'user' oder 'admin' sein.",
            Msg::ConstraintViolation => "Der Eintrag verletzt eine Tabellenbedingung.",
            Msg::UnknownAction => "Unbekannte oder fehlende Aktion.",
            Msg::ColumnsUnavailable => "Fehler beim Abrufen der Spalten",
            Msg::RowsUnavailable => "Fehler beim Abrufen der Tabellendaten",
            Msg::TablesUnavailable => "Fehler beim Abrufen der Tabellen",
            Msg::Internal => "Datenbankfehler",
        }
    }
}

/// Message catalog bound to the configured locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct Messages {
    locale: Locale,
}

impl Messages {
    #[must_use]
    pub const fn new(locale: Locale) -> Self {
        Self { locale }
    }

    #[must_use]
    pub const fn get(&self, msg: Msg) -> &'static str {
        msg.text(self.locale)
    }

    /// A message followed by the offending value, e.g. `Invalid column type: BLOB`.
    #[must_use]
    pub fn with_detail(&self, msg: Msg, detail: &str) -> String {
        format!("{}: {detail}", self.get(msg))
    }
}
