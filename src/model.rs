//! Profile entity, request shapes, and the change-set sent to the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// The single table every operation targets.
pub const PROFILES_TABLE: &str = "profiles";

/// Column order used for SELECT lists and INSERT statements.
pub const PROFILE_COLUMNS: &[&str] = &[
    "id",
    "full_name",
    "email",
    "phone",
    "bio",
    "avatar_url",
    "date_of_birth",
    "gender",
    "address",
    "city",
    "country",
    "role",
    "is_active",
    "created_at",
    "updated_at",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    #[default]
    User,
    Institution,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileRole::User => "user",
            ProfileRole::Institution => "institution",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown profile role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for ProfileRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ProfileRole::User),
            "institution" => Ok(ProfileRole::Institution),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

fn default_active() -> bool {
    true
}

/// A stored profile row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub role: ProfileRole,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /profiles/`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProfile {
    #[schema(example = "Rahul Sharma")]
    pub full_name: String,
    #[schema(example = "rahul@example.com")]
    pub email: String,
    #[schema(example = "9876543210")]
    pub phone: Option<String>,
    #[schema(example = "Software Developer")]
    pub bio: Option<String>,
    #[schema(example = "https://example.com/avatar.jpg")]
    pub avatar_url: Option<String>,
    #[schema(example = "1995-05-15")]
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub role: ProfileRole,
}

impl CreateProfile {
    /// Emails are stored trimmed and lowercased.
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }

    /// Row to insert: every field that carries a value, dates as `YYYY-MM-DD`.
    pub fn to_row(&self) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("full_name".into(), Value::String(self.full_name.clone()));
        row.insert("email".into(), Value::String(self.email.clone()));
        put_text(&mut row, "phone", &self.phone);
        put_text(&mut row, "bio", &self.bio);
        put_text(&mut row, "avatar_url", &self.avatar_url);
        put_date(&mut row, "date_of_birth", self.date_of_birth);
        put_text(&mut row, "gender", &self.gender);
        put_text(&mut row, "address", &self.address);
        put_text(&mut row, "city", &self.city);
        put_text(&mut row, "country", &self.country);
        row.insert("role".into(), Value::String(self.role.as_str().into()));
        row
    }
}

/// Body of `PUT /profiles/:id`. Has no email field, and unknown keys such as `email` are ignored.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfile {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub role: Option<ProfileRole>,
    pub is_active: Option<bool>,
}

impl UpdateProfile {
    pub fn changes(&self) -> ProfileChanges {
        let mut set = Map::new();
        put_text(&mut set, "full_name", &self.full_name);
        put_text(&mut set, "phone", &self.phone);
        put_text(&mut set, "bio", &self.bio);
        put_text(&mut set, "avatar_url", &self.avatar_url);
        put_date(&mut set, "date_of_birth", self.date_of_birth);
        put_text(&mut set, "gender", &self.gender);
        put_text(&mut set, "address", &self.address);
        put_text(&mut set, "city", &self.city);
        put_text(&mut set, "country", &self.country);
        if let Some(role) = self.role {
            set.insert("role".into(), Value::String(role.as_str().into()));
        }
        if let Some(active) = self.is_active {
            set.insert("is_active".into(), Value::Bool(active));
        }
        ProfileChanges(set)
    }
}

/// Columns to change on update, holding only the fields the caller supplied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileChanges(Map<String, Value>);

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn put_text(map: &mut Map<String, Value>, column: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(column.to_string(), Value::String(v.clone()));
    }
}

fn put_date(map: &mut Map<String, Value>, column: &str, value: Option<NaiveDate>) {
    if let Some(d) = value {
        map.insert(column.to_string(), Value::String(d.format(DATE_FORMAT).to_string()));
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

/// Query string of `GET /profiles/`.
#[derive(Clone, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    #[serde(default = "default_limit")]
    #[param(minimum = 1, maximum = 100)]
    pub limit: i64,
    pub is_active: Option<bool>,
}

/// Query string of `GET /profiles/search/`.
#[derive(Clone, Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Matched against full name and email, case-insensitively.
    #[param(min_length = 2)]
    pub q: String,
    #[serde(default = "default_limit")]
    #[param(minimum = 1, maximum = 50)]
    pub limit: i64,
}

/// Validated list window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListFilter {
    pub page: u32,
    pub limit: u32,
    pub is_active: Option<bool>,
}

impl ListFilter {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One window of rows plus the total number of matching rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
