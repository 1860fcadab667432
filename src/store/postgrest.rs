//! PostgREST backend: filtered queries over HTTPS against `{base}/rest/v1/profiles`.

use super::ProfileStore;
use crate::error::StoreError;
use crate::model::{normalize_email, CreateProfile, ListFilter, Page, Profile, ProfileChanges, PROFILES_TABLE};
use crate::sql::like_escape;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const COUNT_EXACT: &str = "count=exact";
/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Error body PostgREST returns on failure.
#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

pub struct PostgrestStore {
    client: Client,
    table_url: String,
}

impl PostgrestStore {
    /// `base_url` is the project URL (e.g. `https://xyz.supabase.co`); `api_key` is sent as `apikey` and bearer token.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
        bearer.set_sensitive(true);
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).build()?;
        Ok(PostgrestStore {
            client,
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), PROFILES_TABLE),
        })
    }

    async fn send(&self, op: &'static str, request: RequestBuilder) -> Result<Response, StoreError> {
        tracing::debug!(op, url = %self.table_url, "postgrest request");
        let response = request.send().await?;
        self.check(op, response).await
    }

    async fn check(&self, op: &'static str, response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(op, status = status.as_u16(), body = %body, "postgrest rejected request");
        Err(rejection(status, &body))
    }

    async fn rows<T: DeserializeOwned>(&self, op: &'static str, request: RequestBuilder) -> Result<Vec<T>, StoreError> {
        let response = self.send(op, request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn first(&self, op: &'static str, request: RequestBuilder) -> Result<Option<Profile>, StoreError> {
        let rows: Vec<Profile> = self.rows(op, request).await?;
        Ok(rows.into_iter().next())
    }

    fn select_where(&self, column: &str, value: &str) -> RequestBuilder {
        let filter = eq(value);
        self.client
            .get(&self.table_url)
            .query(&[("select", "*"), (column, filter.as_str())])
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Double-quote a filter value so PostgREST reserved characters (`,.:()`) are taken literally.
fn quote_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

pub(crate) fn list_params(filter: &ListFilter) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("select", "*".to_string()),
        ("order", "created_at.desc".to_string()),
        ("offset", filter.offset().to_string()),
        ("limit", filter.limit.to_string()),
    ];
    if let Some(active) = filter.is_active {
        params.push(("is_active", eq(active)));
    }
    params
}

pub(crate) fn search_params(term: &str, limit: u32) -> Vec<(&'static str, String)> {
    let pattern = quote_value(&format!("*{}*", like_escape(term)));
    vec![
        ("select", "*".to_string()),
        ("or", format!("(full_name.ilike.{p},email.ilike.{p})", p = pattern)),
        ("limit", limit.to_string()),
    ]
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/0`. `None` when the total is `*`.
pub(crate) fn parse_total(content_range: Option<&str>) -> Option<u64> {
    content_range?.rsplit_once('/')?.1.trim().parse().ok()
}

fn rejection(status: StatusCode, body: &str) -> StoreError {
    let parsed: Option<PostgrestErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());
    let message = parsed
        .map(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());
    if status == StatusCode::CONFLICT || code.as_deref() == Some(UNIQUE_VIOLATION) {
        return StoreError::Conflict(message);
    }
    StoreError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ProfileStore for PostgrestStore {
    async fn create(&self, profile: &CreateProfile) -> Result<Option<Profile>, StoreError> {
        let request = self
            .client
            .post(&self.table_url)
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&profile.to_row());
        self.first("create", request).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.first("get_by_id", self.select_where("id", &id.to_string())).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        let email = normalize_email(email);
        self.first("get_by_email", self.select_where("email", &email)).await
    }

    async fn list(&self, filter: &ListFilter) -> Result<Page<Profile>, StoreError> {
        let request = self
            .client
            .get(&self.table_url)
            .header(PREFER, COUNT_EXACT)
            .query(&list_params(filter));
        tracing::debug!(op = "list", url = %self.table_url, "postgrest request");
        let response = request.send().await?;
        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let total = parse_total(content_range.as_deref());
        // Offset past the last row: PostgREST answers 416 with `*/<total>`.
        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Page {
                items: Vec::new(),
                total: total.unwrap_or(0),
            });
        }
        let response = self.check("list", response).await?;
        let bytes = response.bytes().await?;
        let items: Vec<Profile> = serde_json::from_slice(&bytes)?;
        let total = total.unwrap_or(items.len() as u64);
        Ok(Page { items, total })
    }

    async fn update(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<Profile>, StoreError> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }
        let filter = eq(id);
        let request = self
            .client
            .patch(&self.table_url)
            .header(PREFER, RETURN_REPRESENTATION)
            .query(&[("id", filter.as_str())])
            .json(changes.as_map());
        self.first("update", request).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let filter = eq(id);
        let request = self
            .client
            .delete(&self.table_url)
            .header(PREFER, RETURN_REPRESENTATION)
            .query(&[("id", filter.as_str())]);
        let removed: Vec<serde_json::Value> = self.rows("delete", request).await?;
        Ok(!removed.is_empty())
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Profile>, StoreError> {
        let request = self.client.get(&self.table_url).query(&search_params(term, limit));
        self.rows("search", request).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let request = self
            .client
            .get(&self.table_url)
            .query(&[("select", "id"), ("limit", "1")]);
        self.send("ping", request).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgrest"
    }
}
