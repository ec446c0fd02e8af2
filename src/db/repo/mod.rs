//! Repository layer for database operations.
//!
//! [`Repository<E>`] provides the CRUD, paging and filtering operations shared
//! by every table. Entity-specific queries live in submodules as inherent
//! `impl Repository<Entity>` blocks:
//! - `users.rs` - accounts and sessions
//! - `profiles.rs` - profiles, roles and addresses

mod entity;
mod profiles;
mod query;
mod users;
mod value;

pub use entity::{push_change, Changeset, Entity, Insertable, CREATED_AT, UPDATED_AT};
pub use query::{Condition, Page, Pagination, SortOrder, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use value::{format_timestamp, Value};

use crate::db::error::StoreResult;
use chrono::Utc;
use query::{push_pagination, push_where, quote, Columns};
use sqlx::sqlite::SqlitePool;
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::debug;

/// CRUD façade over the table of one entity type.
///
/// Holds the pool, the table binding (through `E`) and the identifier column.
/// The repository keeps no other state; every call borrows one pooled
/// connection for the duration of its query.
pub struct Repository<E> {
    pool: SqlitePool,
    id_field: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Repository {
            pool: self.pool.clone(),
            id_field: self.id_field,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository {
            pool,
            id_field: E::ID_FIELD,
            _entity: PhantomData,
        }
    }

    /// Use a different identifier column.
    ///
    /// # Errors
    /// Returns `InvalidField` if the column does not exist on the table.
    pub fn with_id_field(mut self, field: &'static str) -> StoreResult<Self> {
        Self::columns().checked(field)?;
        self.id_field = field;
        Ok(self)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn table(&self) -> &'static str {
        E::TABLE
    }

    pub fn id_field(&self) -> &'static str {
        self.id_field
    }

    fn columns() -> Columns {
        Columns {
            table: E::TABLE,
            names: E::COLUMNS,
        }
    }

    fn select_sql() -> String {
        format!(
            "SELECT {} FROM {}",
            Self::columns().select_list(),
            quote(E::TABLE)
        )
    }

    fn returning_sql() -> String {
        format!(" RETURNING {}", Self::columns().select_list())
    }

    async fn fetch_all(&self, sql: &str, params: Vec<Value>) -> StoreResult<Vec<E>> {
        let mut query = sqlx::query_as::<_, E>(sql);
        for param in params {
            query = query.bind(param);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn fetch_optional(&self, sql: &str, params: Vec<Value>) -> StoreResult<Option<E>> {
        let mut query = sqlx::query_as::<_, E>(sql);
        for param in params {
            query = query.bind(param);
        }
        Ok(query.fetch_optional(&self.pool).await?)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All rows, optionally paged and sorted.
    ///
    /// # Errors
    /// Returns an error if the pagination is invalid or the query fails.
    pub async fn find_all(&self, pagination: Option<&Pagination>) -> StoreResult<Vec<E>> {
        self.find_where(&[], pagination).await
    }

    /// Rows matching every condition, optionally paged and sorted.
    ///
    /// # Errors
    /// Returns an error if a field is unknown, the pagination is invalid, or
    /// the query fails.
    pub async fn find_where(
        &self,
        conditions: &[Condition],
        pagination: Option<&Pagination>,
    ) -> StoreResult<Vec<E>> {
        let mut sql = Self::select_sql();
        let mut params = Vec::new();
        push_where(&mut sql, &mut params, Self::columns(), conditions)?;
        if let Some(pagination) = pagination {
            push_pagination(
                &mut sql,
                &mut params,
                Self::columns(),
                self.id_field,
                pagination,
            )?;
        }
        self.fetch_all(&sql, params).await
    }

    /// First row matching every condition.
    pub async fn find_one_where(&self, conditions: &[Condition]) -> StoreResult<Option<E>> {
        let mut sql = Self::select_sql();
        let mut params = Vec::new();
        push_where(&mut sql, &mut params, Self::columns(), conditions)?;
        sql.push_str(" LIMIT 1");
        self.fetch_optional(&sql, params).await
    }

    /// One page of matching rows together with the total match count.
    pub async fn find_page(
        &self,
        conditions: &[Condition],
        pagination: &Pagination,
    ) -> StoreResult<Page<E>> {
        pagination.validate()?;
        let total = self.count_where(conditions).await?;
        let content = self.find_where(conditions, Some(pagination)).await?;
        Ok(Page::new(content, pagination, total))
    }

    /// Look up a row by its identifier.
    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<E>> {
        self.find_one_where(&[Condition::eq(self.id_field, id)])
            .await
    }

    /// All rows whose `field` equals `value`.
    ///
    /// # Errors
    /// Returns `InvalidField` for a column the table does not have.
    pub async fn find_by(&self, field: &str, value: impl Into<Value>) -> StoreResult<Vec<E>> {
        self.find_where(&[Condition::eq(field, value)], None).await
    }

    /// First row whose `field` equals `value`.
    pub async fn find_one_by(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> StoreResult<Option<E>> {
        self.find_one_where(&[Condition::eq(field, value)]).await
    }

    /// Number of rows in the table.
    pub async fn count(&self) -> StoreResult<u64> {
        self.count_where(&[]).await
    }

    /// Number of rows matching every condition.
    pub async fn count_where(&self, conditions: &[Condition]) -> StoreResult<u64> {
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote(E::TABLE));
        let mut params = Vec::new();
        push_where(&mut sql, &mut params, Self::columns(), conditions)?;

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for param in params {
            query = query.bind(param);
        }
        let count = query.fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    pub async fn exists(&self, id: &str) -> StoreResult<bool> {
        let count = self
            .count_where(&[Condition::eq(self.id_field, id)])
            .await?;
        Ok(count > 0)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Identifier and timestamps the store assigns, followed by the caller's
    /// columns.
    ///
    /// The generated id always goes to the primary key column; a custom
    /// `id_field` only changes how rows are looked up.
    fn managed_row(id: String, data: &E::Insert) -> StoreResult<Vec<(&'static str, Value)>> {
        let now = Value::Timestamp(Utc::now());
        let mut row = vec![(E::ID_FIELD, Value::Text(id))];
        for (column, value) in data.values() {
            Self::columns().checked(column)?;
            row.push((column, value));
        }
        row.push((CREATED_AT, now.clone()));
        row.push((UPDATED_AT, now));
        Ok(row)
    }

    fn insert_head(columns: &[&'static str]) -> String {
        let names = columns.iter().map(|c| quote(c)).collect::<Vec<_>>();
        format!(
            "INSERT INTO {} ({}) VALUES ",
            quote(E::TABLE),
            names.join(", ")
        )
    }

    fn row_placeholders(width: usize) -> String {
        format!("({})", vec!["?"; width].join(", "))
    }

    /// Insert one row and return it as stored.
    ///
    /// # Errors
    /// Returns `ConstraintViolation` when the store rejects the row.
    pub async fn create(&self, data: &E::Insert) -> StoreResult<E> {
        let row = Self::managed_row(E::new_id(), data)?;
        let columns: Vec<_> = row.iter().map(|(c, _)| *c).collect();
        let params: Vec<_> = row.into_iter().map(|(_, v)| v).collect();

        let mut sql = Self::insert_head(&columns);
        sql.push_str(&Self::row_placeholders(columns.len()));
        sql.push_str(&Self::returning_sql());

        let mut query = sqlx::query_as::<_, E>(&sql);
        for param in params {
            query = query.bind(param);
        }
        let created = query.fetch_one(&self.pool).await?;
        debug!(table = E::TABLE, id = created.id(), "Created row");
        Ok(created)
    }

    /// Insert a batch in one statement.
    ///
    /// The result follows the input order. An empty batch is a no-op.
    ///
    /// # Errors
    /// Returns an error if any row is rejected; nothing is inserted then.
    pub async fn create_many(&self, data: &[E::Insert]) -> StoreResult<Vec<E>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::with_capacity(data.len());
        let mut columns: Vec<&'static str> = Vec::new();
        let mut params = Vec::new();
        for item in data {
            let id = E::new_id();
            let row = Self::managed_row(id.clone(), item)?;
            if columns.is_empty() {
                columns = row.iter().map(|(c, _)| *c).collect();
            }
            debug_assert!(
                row.iter().map(|(c, _)| *c).eq(columns.iter().copied()),
                "insert shapes must emit identical columns"
            );
            params.extend(row.into_iter().map(|(_, v)| v));
            ids.push(id);
        }

        let mut sql = Self::insert_head(&columns);
        let placeholders = Self::row_placeholders(columns.len());
        sql.push_str(&vec![placeholders.as_str(); data.len()].join(", "));
        sql.push_str(&Self::returning_sql());

        let rows = self.fetch_all(&sql, params).await?;

        // RETURNING does not promise input order.
        let mut by_id: HashMap<String, E> = rows
            .into_iter()
            .map(|row| (row.id().to_string(), row))
            .collect();
        let created = ids
            .iter()
            .map(|id| by_id.remove(id).ok_or(sqlx::Error::RowNotFound))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(table = E::TABLE, count = created.len(), "Created rows");
        Ok(created)
    }

    /// Apply a changeset and refresh `updated_at`.
    ///
    /// Returns `None` when no row has this identifier.
    pub async fn update(&self, id: &str, changes: &E::Update) -> StoreResult<Option<E>> {
        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for (column, value) in changes.changes() {
            if column == UPDATED_AT {
                continue;
            }
            assignments.push(format!("{} = ?", Self::columns().checked(column)?));
            params.push(value);
        }
        assignments.push(format!("{} = ?", quote(UPDATED_AT)));
        params.push(Value::Timestamp(Utc::now()));
        params.push(Value::from(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote(E::TABLE),
            assignments.join(", "),
            quote(self.id_field),
            Self::returning_sql()
        );

        let updated = self.fetch_optional(&sql, params).await?;
        if updated.is_some() {
            debug!(table = E::TABLE, id = id, "Updated row");
        }
        Ok(updated)
    }

    /// Remove a row and return it.
    ///
    /// Returns `None` when no row has this identifier.
    pub async fn delete(&self, id: &str) -> StoreResult<Option<E>> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?{}",
            quote(E::TABLE),
            quote(self.id_field),
            Self::returning_sql()
        );
        let deleted = self.fetch_optional(&sql, vec![Value::from(id)]).await?;
        if deleted.is_some() {
            debug!(table = E::TABLE, id = id, "Deleted row");
        }
        Ok(deleted)
    }

    /// Remove every row matching the conditions and return how many went.
    ///
    /// An empty condition list empties the table.
    pub async fn delete_where(&self, conditions: &[Condition]) -> StoreResult<u64> {
        let mut sql = format!("DELETE FROM {}", quote(E::TABLE));
        let mut params = Vec::new();
        push_where(&mut sql, &mut params, Self::columns(), conditions)?;

        let mut query = sqlx::query(&sql);
        for param in params {
            query = query.bind(param);
        }
        let result = query.execute(&self.pool).await?;
        debug!(
            table = E::TABLE,
            rows = result.rows_affected(),
            "Deleted rows"
        );
        Ok(result.rows_affected())
    }
}
