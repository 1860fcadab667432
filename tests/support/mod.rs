//! In-memory ProfileStore and request helpers shared by the router tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use profile_api::{
    app, AppState, CreateProfile, ListFilter, Page, Profile, ProfileChanges, ProfileStore, StoreError,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Keeps rows in insertion order; each create is one second newer than the last.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Profile>>,
    clock: AtomicUsize,
    pub search_calls: AtomicUsize,
    /// Makes get_by_email miss, so only the unique check inside create can catch duplicates.
    pub hide_emails: AtomicBool,
    /// Makes delete report that nothing was removed.
    pub fail_deletes: AtomicBool,
    /// Makes create return no row.
    pub swallow_creates: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryStore::default())
    }

    fn now(&self) -> DateTime<Utc> {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst) as i64;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(tick)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

fn text(changes: &ProfileChanges, column: &str) -> Option<Option<String>> {
    changes.get(column).map(|v| v.as_str().map(str::to_string))
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create(&self, profile: &CreateProfile) -> Result<Option<Profile>, StoreError> {
        if self.swallow_creates.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|p| p.email == profile.email) {
            return Err(StoreError::Conflict("duplicate key value violates unique constraint".into()));
        }
        let now = self.now();
        let row = Profile {
            id: Uuid::new_v4(),
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            bio: profile.bio.clone(),
            avatar_url: profile.avatar_url.clone(),
            date_of_birth: profile.date_of_birth,
            gender: profile.gender.clone(),
            address: profile.address.clone(),
            city: profile.city.clone(),
            country: profile.country.clone(),
            role: profile.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(Some(row))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        if self.hide_emails.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let email = email.to_lowercase();
        Ok(self.rows.lock().unwrap().iter().find(|p| p.email == email).cloned())
    }

    async fn list(&self, filter: &ListFilter) -> Result<Page<Profile>, StoreError> {
        let mut matching: Vec<Profile> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.is_active.map_or(true, |a| p.is_active == a))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn update(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<Profile>, StoreError> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }
        let now = self.now();
        let mut rows = self.rows.lock().unwrap();
        let Some(p) = rows.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(Some(v)) = text(changes, "full_name") {
            p.full_name = v;
        }
        for (column, slot) in [
            ("phone", &mut p.phone),
            ("bio", &mut p.bio),
            ("avatar_url", &mut p.avatar_url),
            ("gender", &mut p.gender),
            ("address", &mut p.address),
            ("city", &mut p.city),
            ("country", &mut p.country),
        ] {
            if let Some(v) = text(changes, column) {
                *slot = v;
            }
        }
        if let Some(Some(d)) = text(changes, "date_of_birth") {
            p.date_of_birth = NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok();
        }
        if let Some(Some(r)) = text(changes, "role") {
            p.role = r.parse().unwrap();
        }
        if let Some(Value::Bool(a)) = changes.get("is_active") {
            p.is_active = *a;
        }
        p.updated_at = now;
        Ok(Some(p.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() < before)
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Profile>, StoreError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let term = term.to_lowercase();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.full_name.to_lowercase().contains(&term) || p.email.to_lowercase().contains(&term))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

pub fn router(store: Arc<MemoryStore>) -> Router {
    app(AppState::new(store))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Create a profile through the API and return its JSON record.
pub async fn create(app: &Router, full_name: &str, email: &str) -> Value {
    let (status, body) = post_json(
        app,
        "/api/v1/profiles/",
        serde_json::json!({ "full_name": full_name, "email": email }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}
