//! Router assembly: common routes at the root, profile routes under `/api/v1`, plus middleware.

mod common;
mod profile;

pub use common::common_routes;
pub use profile::profile_routes;

use crate::handlers::profile as handlers;
use crate::handlers::profile::Deleted;
use crate::model::{CreateProfile, Profile, ProfileRole, UpdateProfile};
use crate::response::ErrorDetail;
use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;

pub const API_PREFIX: &str = "/api/v1";
const BODY_LIMIT_BYTES: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    info(title = "Profile API", description = "Create, list, search, update and delete profiles."),
    paths(
        handlers::create,
        handlers::list,
        handlers::search,
        handlers::read,
        handlers::update,
        handlers::delete
    ),
    components(schemas(Profile, ProfileRole, CreateProfile, UpdateProfile, Deleted, ErrorDetail)),
    tags((name = "profiles", description = "Profile management"))
)]
pub struct ApiDoc;

/// The full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest(API_PREFIX, profile_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
                .layer(CorsLayer::permissive()),
        )
}
