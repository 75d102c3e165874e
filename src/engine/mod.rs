//! Schema-driven statement generation.
//!
//! Everything in here is pure: builders take introspected [`TableSchema`]s and
//! submitted form fields and return [`Statement`]s that the store executes.
//! Identifiers are validated and quoted in [`ident`] and nowhere else.
//!
//! [`TableSchema`]: crate::types::TableSchema

mod column_type;
mod fields;
pub mod ident;
mod statement;

pub use column_type::ColumnType;
pub use fields::{FieldMap, is_truthy};
pub use ident::{is_valid_name, quote_ident, validate_name};
pub use statement::{
    ColumnDef, ColumnSpec, CreateTablePlan, Statement, build_delete, build_drop_table,
    build_insert, build_select_all, build_select_one, build_update,
};
