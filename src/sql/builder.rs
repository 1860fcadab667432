//! Builds parameterized SELECT, INSERT, UPDATE, DELETE against the profiles table.

use crate::model::{ListFilter, ProfileChanges, PROFILES_TABLE, PROFILE_COLUMNS};
use serde_json::{Map, Value};
use uuid::Uuid;

const SCHEMA: &str = "public";

/// Quote identifier for PostgreSQL (safe: only from the fixed column list).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn qualified_table() -> String {
    format!("{}.{}", quoted(SCHEMA), quoted(PROFILES_TABLE))
}

/// Columns whose text-bound parameters need a cast.
fn column_cast(column: &str) -> Option<&'static str> {
    match column {
        "id" => Some("uuid"),
        "date_of_birth" => Some("date"),
        "created_at" | "updated_at" => Some("timestamptz"),
        _ => None,
    }
}

fn is_profile_column(column: &str) -> bool {
    PROFILE_COLUMNS.contains(&column)
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value for `column` and return its placeholder, cast when the column needs it.
    fn placeholder(&mut self, column: &str, v: Value) -> String {
        let n = self.push_param(v);
        column_cast(column)
            .map(|t| format!("${}::{}", n, t))
            .unwrap_or_else(|| format!("${}", n))
    }
}

fn select_column_list() -> String {
    PROFILE_COLUMNS.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ")
}

fn active_clause(q: &mut QueryBuf, filter: &ListFilter) -> String {
    match filter.is_active {
        Some(active) => {
            let ph = q.placeholder("is_active", Value::Bool(active));
            format!(" WHERE {} = {}", quoted("is_active"), ph)
        }
        None => String::new(),
    }
}

/// Escape LIKE metacharacters so the term matches literally.
pub fn like_escape(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// SELECT by a single column equality (id or email).
pub fn select_by_column(column: &str, value: Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder(column, value);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(),
        qualified_table(),
        quoted(column),
        ph
    );
    q
}

pub fn select_by_id(id: Uuid) -> QueryBuf {
    select_by_column("id", Value::String(id.to_string()))
}

pub fn select_by_email(email: &str) -> QueryBuf {
    select_by_column("email", Value::String(email.to_string()))
}

/// One page ordered by creation time, newest first.
pub fn select_page(filter: &ListFilter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = active_clause(&mut q, filter);
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} DESC LIMIT {} OFFSET {}",
        select_column_list(),
        qualified_table(),
        where_clause,
        quoted("created_at"),
        filter.limit,
        filter.offset()
    );
    q
}

/// Total rows matching the list filter, independent of the page window.
pub fn count(filter: &ListFilter) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = active_clause(&mut q, filter);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", qualified_table(), where_clause);
    q
}

/// Case-insensitive substring match on full name or email. No ORDER BY.
pub fn search(term: &str, limit: u32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::String(format!("%{}%", like_escape(term))));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} ILIKE ${n} OR {} ILIKE ${n} LIMIT {}",
        select_column_list(),
        qualified_table(),
        quoted("full_name"),
        quoted("email"),
        limit,
        n = n
    );
    q
}

/// INSERT the provided columns, in table column order; the database fills id, flags and timestamps.
pub fn insert(row: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for column in PROFILE_COLUMNS {
        let Some(v) = row.get(*column) else { continue };
        if v.is_null() {
            continue;
        }
        placeholders.push(q.placeholder(column, v.clone()));
        cols.push(quoted(column));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list()
    );
    q
}

/// UPDATE by id: SET only the change-set columns, plus `updated_at`. Never touches id or email.
pub fn update(id: Uuid, changes: &ProfileChanges) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (k, v) in changes.iter() {
        if matches!(k.as_str(), "id" | "email" | "created_at" | "updated_at") || !is_profile_column(k) {
            continue;
        }
        let rhs = q.placeholder(k, v.clone());
        sets.push(format!("{} = {}", quoted(k), rhs));
    }
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    let id_ph = q.placeholder("id", Value::String(id.to_string()));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(),
        sets.join(", "),
        quoted("id"),
        id_ph,
        select_column_list()
    );
    q
}

/// DELETE by id.
pub fn delete(id: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder("id", Value::String(id.to_string()));
    q.sql = format!("DELETE FROM {} WHERE {} = {}", qualified_table(), quoted("id"), ph);
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UpdateProfile;

    const TABLE: &str = "\"public\".\"profiles\"";

    #[test]
    fn select_by_id_casts_uuid() {
        let id = Uuid::nil();
        let q = select_by_id(id);
        assert!(q.sql.starts_with("SELECT \"id\", \"full_name\", \"email\""));
        assert!(q.sql.ends_with(&format!("FROM {} WHERE \"id\" = $1::uuid", TABLE)));
        assert_eq!(q.params, vec![Value::String(id.to_string())]);
    }

    #[test]
    fn page_without_filter() {
        let q = select_page(&ListFilter { page: 2, limit: 10, is_active: None });
        assert!(q.sql.ends_with(&format!(
            "FROM {} ORDER BY \"created_at\" DESC LIMIT 10 OFFSET 10",
            TABLE
        )));
        assert!(q.params.is_empty());
    }

    #[test]
    fn page_and_count_share_active_filter() {
        let filter = ListFilter { page: 1, limit: 5, is_active: Some(false) };
        let page = select_page(&filter);
        assert!(page.sql.contains("WHERE \"is_active\" = $1 ORDER BY"));
        assert_eq!(page.params, vec![Value::Bool(false)]);
        let total = count(&filter);
        assert_eq!(
            total.sql,
            format!("SELECT COUNT(*) FROM {} WHERE \"is_active\" = $1", TABLE)
        );
        assert_eq!(total.params, vec![Value::Bool(false)]);
    }

    #[test]
    fn search_escapes_like_metacharacters() {
        let q = search("50%_off\\", 7);
        assert!(q.sql.contains("WHERE \"full_name\" ILIKE $1 OR \"email\" ILIKE $1 LIMIT 7"));
        assert!(!q.sql.contains("ORDER BY"));
        assert_eq!(q.params, vec![Value::String("%50\\%\\_off\\\\%".into())]);
    }

    #[test]
    fn insert_uses_column_order_and_date_cast() {
        let mut row = Map::new();
        row.insert("role".into(), Value::String("user".into()));
        row.insert("email".into(), Value::String("a@example.com".into()));
        row.insert("full_name".into(), Value::String("Asha".into()));
        row.insert("date_of_birth".into(), Value::String("1990-01-02".into()));
        let q = insert(&row);
        assert!(q.sql.starts_with(&format!(
            "INSERT INTO {} (\"full_name\", \"email\", \"date_of_birth\", \"role\") VALUES ($1, $2, $3::date, $4) RETURNING \"id\"",
            TABLE
        )));
        assert_eq!(q.params.len(), 4);
        assert_eq!(q.params[2], Value::String("1990-01-02".into()));
    }

    #[test]
    fn update_sets_only_changes_and_timestamp() {
        let changes = UpdateProfile {
            city: Some("Pune".into()),
            ..Default::default()
        }
        .changes();
        let id = Uuid::nil();
        let q = update(id, &changes);
        assert!(q.sql.starts_with(&format!(
            "UPDATE {} SET \"city\" = $1, \"updated_at\" = NOW() WHERE \"id\" = $2::uuid RETURNING",
            TABLE
        )));
        assert_eq!(
            q.params,
            vec![Value::String("Pune".into()), Value::String(id.to_string())]
        );
    }

    #[test]
    fn delete_by_id() {
        let q = delete(Uuid::nil());
        assert_eq!(q.sql, format!("DELETE FROM {} WHERE \"id\" = $1::uuid", TABLE));
    }
}
