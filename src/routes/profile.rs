//! Profile routes. Collection and search paths are served with and without the trailing slash.

use crate::handlers::profile::{create, delete as delete_handler, list, read, search, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn profile_routes(state: AppState) -> Router {
    Router::new()
        .route("/profiles", get(list).post(create))
        .route("/profiles/", get(list).post(create))
        .route("/profiles/search", get(search))
        .route("/profiles/search/", get(search))
        .route(
            "/profiles/:id",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}
