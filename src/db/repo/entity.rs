//! Table binding for the generic repository.

use super::value::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// A record type mapped to one table.
///
/// Every table carries a text identifier plus `created_at` / `updated_at`,
/// all three assigned by the repository rather than the caller.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    /// Shape accepted by `create` / `create_many`.
    type Insert: Insertable;
    /// Shape accepted by `update`.
    type Update: Changeset;

    const TABLE: &'static str;
    /// Every column of the table, including the base columns.
    const COLUMNS: &'static [&'static str];
    const ID_FIELD: &'static str = "id";

    /// Value of the identifier column.
    fn id(&self) -> &str;

    fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Insert shape of an entity.
///
/// Implementations must emit the same columns, in the same order, for every
/// value so that batches can share one multi-row `INSERT`.
pub trait Insertable: Send + Sync {
    fn values(&self) -> Vec<(&'static str, Value)>;
}

/// Partial update of an entity. Only the columns returned are written.
pub trait Changeset: Send + Sync {
    fn changes(&self) -> Vec<(&'static str, Value)>;
}

/// Push `column` into a changeset when the field was set.
///
/// Nullable columns use `Option<Option<T>>` so `Some(None)` clears them.
pub fn push_change<T: Into<Value>>(
    out: &mut Vec<(&'static str, Value)>,
    column: &'static str,
    value: Option<T>,
) {
    if let Some(v) = value {
        out.push((column, v.into()));
    }
}
