//! Decoding of the form-encoded `POST /` body.
//!
//! Row values arrive as `data[<column>]=<value>` and new table columns as
//! `columns[<i>][name]` / `columns[<i>][type]`. A checkbox is preceded by a
//! hidden field with the same key, so when a key repeats the last value wins.

use std::collections::BTreeMap;

use crate::engine::{ColumnSpec, FieldMap};

/// The mutation requested by a `POST /` submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateTable,
    DeleteTable,
    AddEntry,
    UpdateEntry,
    DeleteEntry,
}

impl Action {
    const FLAGS: [(&'static str, Action); 5] = [
        ("create_table", Action::CreateTable),
        ("delete_table", Action::DeleteTable),
        ("add_entry", Action::AddEntry),
        ("update_entry", Action::UpdateEntry),
        ("delete_entry", Action::DeleteEntry),
    ];

    fn from_flag(key: &str) -> Option<Self> {
        Self::FLAGS
            .iter()
            .find(|(flag, _)| *flag == key)
            .map(|(_, action)| *action)
    }
}

#[derive(Debug, Default)]
pub struct Submission {
    actions: Vec<Action>,
    pub table: Option<String>,
    pub table_name: Option<String>,
    pub id: Option<String>,
    pub data: FieldMap,
    pub columns: Vec<ColumnSpec>,
}

impl Submission {
    pub fn parse<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut submission = Submission::default();
        let mut columns: BTreeMap<usize, ColumnSpec> = BTreeMap::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.into();

            if let Some(action) = Action::from_flag(key) {
                if !submission.actions.contains(&action) {
                    submission.actions.push(action);
                }
                continue;
            }

            match key {
                "table" => submission.table = Some(value),
                "table_name" => submission.table_name = Some(value),
                "id" => submission.id = Some(value),
                _ => {
                    if let Some(column) = bracketed(key, "data") {
                        submission.data.insert(column, value);
                    } else if let Some((index, field)) = column_field(key) {
                        let spec = columns.entry(index).or_default();
                        match field {
                            "name" => spec.name = value,
                            "type" => spec.column_type = value,
                            _ => {}
                        }
                    }
                }
            }
        }

        submission.columns = columns.into_values().collect();
        submission
    }

    /// The single action flag present, if exactly one was submitted.
    #[must_use]
    pub fn action(&self) -> Option<Action> {
        match self.actions.as_slice() {
            [action] => Some(*action),
            _ => None,
        }
    }
}

/// `data[title]` -> `title`
fn bracketed<'a>(key: &'a str, outer: &str) -> Option<&'a str> {
    key.strip_prefix(outer)?
        .strip_prefix('[')?
        .strip_suffix(']')
        .filter(|inner| !inner.is_empty() && !inner.contains(['[', ']']))
}

/// `columns[3][name]` -> `(3, "name")`
fn column_field(key: &str) -> Option<(usize, &str)> {
    let rest = key.strip_prefix("columns[")?;
    let (index, rest) = rest.split_once("][")?;
    let field = rest.strip_suffix(']')?;
    Some((index.parse().ok()?, field))
}
