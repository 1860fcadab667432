//! Direct PostgreSQL backend over a sqlx pool, using the parameterized builders in `crate::sql`.

use super::ProfileStore;
use crate::error::StoreError;
use crate::model::{normalize_email, CreateProfile, ListFilter, Page, Profile, ProfileChanges, ProfileRole};
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        PgProfileStore { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(PgProfileStore::new(pool))
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Profile>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::try_from(p)?);
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(row_to_profile).transpose()?)
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Profile>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::try_from(p)?);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_profile).collect::<Result<Vec<_>, _>>()?)
    }
}

fn row_to_profile(row: &PgRow) -> Result<Profile, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let role: ProfileRole = role.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(Profile {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        bio: row.try_get("bio")?,
        avatar_url: row.try_get("avatar_url")?,
        date_of_birth: row.try_get("date_of_birth")?,
        gender: row.try_get("gender")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        country: row.try_get("country")?,
        role,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn create(&self, profile: &CreateProfile) -> Result<Option<Profile>, StoreError> {
        self.fetch_optional(&sql::insert(&profile.to_row())).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.fetch_optional(&sql::select_by_id(id)).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        self.fetch_optional(&sql::select_by_email(&normalize_email(email))).await
    }

    async fn list(&self, filter: &ListFilter) -> Result<Page<Profile>, StoreError> {
        let items = self.fetch_all(&sql::select_page(filter)).await?;
        let q = sql::count(filter);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut count = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            count = count.bind(PgBindValue::try_from(p)?);
        }
        let total = count.fetch_one(&self.pool).await?;
        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn update(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<Profile>, StoreError> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }
        self.fetch_optional(&sql::update(id, changes)).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let q = sql::delete(id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::try_from(p)?);
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Profile>, StoreError> {
        self.fetch_all(&sql::search(term, limit)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
