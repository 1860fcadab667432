//! Profile store: the single point of translation between typed profile operations and the backing database.

mod postgres;
mod postgrest;

pub use postgres::PgProfileStore;
pub use postgrest::PostgrestStore;

use crate::config::StoreSettings;
use crate::error::StoreError;
use crate::model::{CreateProfile, ListFilter, Page, Profile, ProfileChanges};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Operations over the `profiles` table. Absence is `Ok(None)` / `Ok(false)`, never an error.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert a new profile. `None` if the store accepted the call but returned no row.
    async fn create(&self, profile: &CreateProfile) -> Result<Option<Profile>, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError>;

    /// One page, newest first, plus the total count of matching rows.
    async fn list(&self, filter: &ListFilter) -> Result<Page<Profile>, StoreError>;

    /// Apply only the given changes. An empty change-set reads the current row without writing.
    async fn update(&self, id: Uuid, changes: &ProfileChanges) -> Result<Option<Profile>, StoreError>;

    /// True only if a row was actually removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Case-insensitive substring match on full name or email; order is unspecified.
    async fn search(&self, term: &str, limit: u32) -> Result<Vec<Profile>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}

/// Build the process-wide store from settings. Called once at startup.
pub async fn connect(settings: &StoreSettings) -> Result<Arc<dyn ProfileStore>, StoreError> {
    let store: Arc<dyn ProfileStore> = match settings {
        StoreSettings::Postgrest { url, key } => Arc::new(PostgrestStore::new(url, key)?),
        StoreSettings::Postgres {
            database_url,
            max_connections,
        } => Arc::new(PgProfileStore::connect(database_url, *max_connections).await?),
    };
    Ok(store)
}
