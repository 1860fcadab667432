//! Profile API: CRUD and search over a single `profiles` table, backed by PostgREST or PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;
pub mod store;
pub mod validation;

pub use config::{Settings, StoreSettings};
pub use error::{AppError, ConfigError, StoreError};
pub use model::{CreateProfile, ListFilter, Page, Profile, ProfileChanges, ProfileRole, UpdateProfile};
pub use response::{success_many, success_one, success_one_ok, Envelope, Paginated};
pub use routes::{app, common_routes, profile_routes, ApiDoc};
pub use state::AppState;
pub use store::{connect, PgProfileStore, PostgrestStore, ProfileStore};
