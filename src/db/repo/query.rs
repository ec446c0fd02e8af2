//! Pagination, filter conditions, and the SQL fragments built from them.

use super::value::Value;
use crate::db::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Optional paging and ordering for list queries.
///
/// `page` is 1-based. Missing values fall back to page 1, limit 10, ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Pagination {
            page: Some(page),
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or_default()
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page().saturating_sub(1)) * u64::from(self.limit())
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.page() == 0 {
            return Err(StoreError::InvalidPagination(
                "page must be a positive integer".to_string(),
            ));
        }
        if self.limit() == 0 {
            return Err(StoreError::InvalidPagination(
                "limit must be a positive integer".to_string(),
            ));
        }
        self.sql_offset()?;
        Ok(())
    }

    /// The offset as SQLite's signed integer.
    fn sql_offset(&self) -> StoreResult<i64> {
        i64::try_from(self.offset()).map_err(|_| {
            StoreError::InvalidPagination(format!(
                "page {} with limit {} is out of range",
                self.page(),
                self.limit()
            ))
        })
    }
}

/// One page of results with the total row count behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pagination: &Pagination, total: u64) -> Self {
        let limit = u64::from(pagination.limit());
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit)
        };
        Page {
            content,
            page: pagination.page(),
            limit: pagination.limit(),
            total,
            total_pages,
        }
    }
}

/// A filter on one column. A list of conditions is AND-combined.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    Between(String, Value, Value),
    /// Case-sensitive substring match.
    Like(String, String),
    /// Case-insensitive substring match.
    ILike(String, String),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    IsNull(String),
    IsNotNull(String),
}

impl Condition {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Ne(field.into(), value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Gt(field.into(), value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Gte(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Lt(field.into(), value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Lte(field.into(), value.into())
    }

    pub fn between(
        field: impl Into<String>,
        min: impl Into<Value>,
        max: impl Into<Value>,
    ) -> Self {
        Condition::Between(field.into(), min.into(), max.into())
    }

    pub fn like(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Condition::Like(field.into(), needle.into())
    }

    pub fn ilike(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Condition::ILike(field.into(), needle.into())
    }

    pub fn in_list<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::NotIn(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Condition::IsNull(field.into())
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Condition::IsNotNull(field.into())
    }

    pub fn field(&self) -> &str {
        match self {
            Condition::Eq(f, _)
            | Condition::Ne(f, _)
            | Condition::Gt(f, _)
            | Condition::Gte(f, _)
            | Condition::Lt(f, _)
            | Condition::Lte(f, _)
            | Condition::Between(f, _, _)
            | Condition::Like(f, _)
            | Condition::ILike(f, _)
            | Condition::In(f, _)
            | Condition::NotIn(f, _)
            | Condition::IsNull(f)
            | Condition::IsNotNull(f) => f,
        }
    }
}

/// Column names a query is allowed to reference.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Columns {
    pub table: &'static str,
    pub names: &'static [&'static str],
}

impl Columns {
    /// Validate a field name and return it quoted.
    pub fn checked(&self, field: &str) -> StoreResult<String> {
        if self.names.contains(&field) {
            Ok(quote(field))
        } else {
            Err(StoreError::InvalidField {
                table: self.table,
                field: field.to_string(),
            })
        }
    }

    pub fn select_list(&self) -> String {
        self.names
            .iter()
            .map(|c| quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

/// Append `WHERE ...` for `conditions`, collecting bind values in order.
pub(crate) fn push_where(
    sql: &mut String,
    params: &mut Vec<Value>,
    columns: Columns,
    conditions: &[Condition],
) -> StoreResult<()> {
    if conditions.is_empty() {
        return Ok(());
    }

    let mut clauses = Vec::with_capacity(conditions.len());
    for cond in conditions {
        let col = columns.checked(cond.field())?;
        let clause = match cond {
            Condition::Eq(_, Value::Null) => format!("{col} IS NULL"),
            Condition::Ne(_, Value::Null) => format!("{col} IS NOT NULL"),
            Condition::Eq(_, v) => binary(&col, "=", v, params),
            Condition::Ne(_, v) => binary(&col, "!=", v, params),
            Condition::Gt(_, v) => binary(&col, ">", v, params),
            Condition::Gte(_, v) => binary(&col, ">=", v, params),
            Condition::Lt(_, v) => binary(&col, "<", v, params),
            Condition::Lte(_, v) => binary(&col, "<=", v, params),
            Condition::Between(_, min, max) => {
                params.push(min.clone());
                params.push(max.clone());
                format!("{col} BETWEEN ? AND ?")
            }
            // SQLite's LIKE folds ASCII case, so the exact match uses instr.
            Condition::Like(_, needle) => {
                params.push(Value::Text(needle.clone()));
                format!("instr({col}, ?) > 0")
            }
            Condition::ILike(_, needle) => {
                params.push(Value::Text(escape_like(needle)));
                format!("LOWER({col}) LIKE LOWER(?) ESCAPE '\\'")
            }
            // An empty list matches nothing; its negation matches everything.
            Condition::In(_, values) if values.is_empty() => "0 = 1".to_string(),
            Condition::NotIn(_, values) if values.is_empty() => "1 = 1".to_string(),
            Condition::In(_, values) => format!("{col} IN ({})", placeholders(values, params)),
            Condition::NotIn(_, values) => {
                format!("{col} NOT IN ({})", placeholders(values, params))
            }
            Condition::IsNull(_) => format!("{col} IS NULL"),
            Condition::IsNotNull(_) => format!("{col} IS NOT NULL"),
        };
        clauses.push(clause);
    }

    sql.push_str(" WHERE ");
    sql.push_str(&clauses.join(" AND "));
    Ok(())
}

fn binary(col: &str, op: &str, value: &Value, params: &mut Vec<Value>) -> String {
    params.push(value.clone());
    format!("{col} {op} ?")
}

fn placeholders(values: &[Value], params: &mut Vec<Value>) -> String {
    params.extend(values.iter().cloned());
    vec!["?"; values.len()].join(", ")
}

/// Append `ORDER BY ... LIMIT ? OFFSET ?`.
///
/// The identifier is always the last sort key so page boundaries are stable.
pub(crate) fn push_pagination(
    sql: &mut String,
    params: &mut Vec<Value>,
    columns: Columns,
    id_field: &str,
    pagination: &Pagination,
) -> StoreResult<()> {
    pagination.validate()?;
    let id_col = columns.checked(id_field)?;

    match pagination.sort_by.as_deref() {
        Some(field) if field != id_field => {
            let col = columns.checked(field)?;
            let order = pagination.sort_order().as_sql();
            sql.push_str(&format!(" ORDER BY {col} {order}, {id_col} {order}"));
        }
        Some(_) => {
            sql.push_str(&format!(
                " ORDER BY {id_col} {}",
                pagination.sort_order().as_sql()
            ));
        }
        None => sql.push_str(&format!(" ORDER BY {id_col} ASC")),
    }

    sql.push_str(" LIMIT ? OFFSET ?");
    params.push(Value::Int(i64::from(pagination.limit())));
    params.push(Value::Int(pagination.sql_offset()?));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: Columns = Columns {
        table: "widgets",
        names: &["id", "name", "size", "created_at"],
    };

    #[test]
    fn test_pagination_defaults_and_offset() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.sort_order(), SortOrder::Asc);
        assert_eq!(p.offset(), 0);

        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn test_pagination_rejects_zero() {
        assert!(matches!(
            Pagination::new(0, 10).validate(),
            Err(StoreError::InvalidPagination(_))
        ));
        assert!(matches!(
            Pagination::new(1, 0).validate(),
            Err(StoreError::InvalidPagination(_))
        ));
    }

    #[test]
    fn test_pagination_deserializes_camel_case() {
        let p: Pagination =
            serde_json::from_str(r#"{"page":2,"limit":5,"sortBy":"name","sortOrder":"desc"}"#)
                .unwrap();
        assert_eq!(
            p,
            Pagination::new(2, 5).sorted_by("name", SortOrder::Desc)
        );
    }

    #[test]
    fn test_page_total_pages() {
        let page = Page::new(vec![1, 2, 3], &Pagination::new(1, 10), 21);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 1);

        let empty: Page<i32> = Page::new(vec![], &Pagination::default(), 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_where_clause_rendering() {
        let mut sql = String::from("SELECT * FROM widgets");
        let mut params = Vec::new();
        push_where(
            &mut sql,
            &mut params,
            COLUMNS,
            &[
                Condition::eq("name", "bolt"),
                Condition::between("size", 1, 5),
                Condition::in_list("id", ["a", "b"]),
                Condition::is_null("created_at"),
            ],
        )
        .unwrap();

        assert_eq!(
            sql,
            "SELECT * FROM widgets WHERE \"name\" = ? AND \"size\" BETWEEN ? AND ? \
             AND \"id\" IN (?, ?) AND \"created_at\" IS NULL"
        );
        assert_eq!(
            params,
            vec![
                Value::from("bolt"),
                Value::Int(1),
                Value::Int(5),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_eq_null_renders_is_null() {
        let mut sql = String::new();
        let mut params = Vec::new();
        push_where(&mut sql, &mut params, COLUMNS, &[Condition::eq("name", Value::Null)]).unwrap();
        assert_eq!(sql, " WHERE \"name\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_empty_in_list() {
        let mut sql = String::new();
        let mut params = Vec::new();
        push_where(
            &mut sql,
            &mut params,
            COLUMNS,
            &[Condition::in_list("id", Vec::<String>::new())],
        )
        .unwrap();
        assert_eq!(sql, " WHERE 0 = 1");
    }

    #[test]
    fn test_like_escapes_wildcards() {
        let mut sql = String::new();
        let mut params = Vec::new();
        push_where(&mut sql, &mut params, COLUMNS, &[Condition::ilike("name", "50%_off")]).unwrap();
        assert_eq!(sql, " WHERE LOWER(\"name\") LIKE LOWER(?) ESCAPE '\\'");
        assert_eq!(params, vec![Value::from("%50\\%\\_off%")]);
    }

    #[test]
    fn test_like_is_exact_substring() {
        let mut sql = String::new();
        let mut params = Vec::new();
        push_where(&mut sql, &mut params, COLUMNS, &[Condition::like("name", "50%_off")]).unwrap();
        assert_eq!(sql, " WHERE instr(\"name\", ?) > 0");
        assert_eq!(params, vec![Value::from("50%_off")]);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut sql = String::new();
        let mut params = Vec::new();
        let err = push_where(
            &mut sql,
            &mut params,
            COLUMNS,
            &[Condition::eq("name; DROP TABLE widgets", "x")],
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { table: "widgets", .. }));
        assert!(sql.is_empty());
    }

    #[test]
    fn test_pagination_clause() {
        let mut sql = String::new();
        let mut params = Vec::new();
        push_pagination(
            &mut sql,
            &mut params,
            COLUMNS,
            "id",
            &Pagination::new(2, 10).sorted_by("name", SortOrder::Desc),
        )
        .unwrap();
        assert_eq!(sql, " ORDER BY \"name\" DESC, \"id\" DESC LIMIT ? OFFSET ?");
        assert_eq!(params, vec![Value::Int(10), Value::Int(10)]);
    }

    #[test]
    fn test_pagination_offset_out_of_range() {
        let huge = Pagination::new(u32::MAX, u32::MAX);
        assert!(matches!(huge.validate(), Err(StoreError::InvalidPagination(_))));

        let mut sql = String::new();
        let mut params = Vec::new();
        let err = push_pagination(&mut sql, &mut params, COLUMNS, "id", &huge).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPagination(_)));

        // Large but representable offsets are kept as-is.
        let far = Pagination::new(u32::MAX, 1);
        assert!(far.validate().is_ok());
        assert_eq!(far.offset(), u64::from(u32::MAX) - 1);
    }

    #[test]
    fn test_pagination_unknown_sort_field() {
        let mut sql = String::new();
        let mut params = Vec::new();
        let err = push_pagination(
            &mut sql,
            &mut params,
            COLUMNS,
            "id",
            &Pagination::default().sorted_by("colour", SortOrder::Asc),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField { .. }));
    }
}
