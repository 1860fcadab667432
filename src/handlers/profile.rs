//! Profile CRUD handlers: create, list, search, read, update, delete.

use crate::error::{AppError, StoreError};
use crate::model::{CreateProfile, ListQuery, Profile, SearchQuery, UpdateProfile};
use crate::response::{paginated, success_many, success_one, success_one_ok, Envelope, ErrorDetail, Paginated};
use crate::state::AppState;
use crate::validation::ProfileValidator;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

const EMAIL_EXISTS: &str = "Email already exists!";
const NOT_FOUND: &str = "Profile not found!";

#[derive(Debug, Serialize, ToSchema)]
pub struct Deleted {
    pub deleted_id: Uuid,
}

fn parse_id(id_str: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest(format!("invalid profile id: {}", id_str)))
}

fn not_found() -> AppError {
    AppError::NotFound(NOT_FOUND.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/profiles/",
    tag = "profiles",
    request_body = CreateProfile,
    responses(
        (status = 201, description = "Profile created", body = Envelope<Profile>),
        (status = 400, description = "Email already exists", body = Envelope<ErrorDetail>),
        (status = 422, description = "Invalid body", body = Envelope<ErrorDetail>)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateProfile>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let body = body.normalized();
    ProfileValidator::validate_create(&body)?;
    // Fast path only; the storage unique constraint is what actually holds under concurrent creates.
    if state.store.get_by_email(&body.email).await?.is_some() {
        tracing::warn!(email = %body.email, "create rejected: email already registered");
        return Err(AppError::Conflict(EMAIL_EXISTS.into()));
    }
    let created = state.store.create(&body).await.map_err(|e| match e {
        StoreError::Conflict(detail) => {
            tracing::warn!(email = %body.email, detail = %detail, "create rejected by unique constraint");
            AppError::Conflict(EMAIL_EXISTS.into())
        }
        other => other.into(),
    })?;
    let profile = created.ok_or_else(|| AppError::Internal("Failed to create profile".into()))?;
    tracing::info!(id = %profile.id, "profile created");
    Ok(success_one("Profile created successfully!", profile))
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/",
    tag = "profiles",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of profiles", body = Paginated<Profile>),
        (status = 422, description = "Invalid page or limit", body = Envelope<ErrorDetail>)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let filter = ProfileValidator::validate_list(&query)?;
    let page = state.store.list(&filter).await?;
    Ok(paginated(page, &filter))
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/search/",
    tag = "profiles",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching profiles", body = Envelope<Vec<Profile>>),
        (status = 422, description = "Search term too short", body = Envelope<ErrorDetail>)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let limit = ProfileValidator::validate_search(&query)?;
    let profiles = state.store.search(&query.q, limit).await?;
    Ok(success_many(profiles))
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/{id}",
    tag = "profiles",
    params(("id" = Uuid, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile found", body = Envelope<Profile>),
        (status = 400, description = "Malformed id", body = Envelope<ErrorDetail>),
        (status = 404, description = "No such profile", body = Envelope<ErrorDetail>)
    )
)]
pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let profile = state.store.get_by_id(id).await?.ok_or_else(not_found)?;
    Ok(success_one_ok("Profile found!", profile))
}

#[utoipa::path(
    put,
    path = "/api/v1/profiles/{id}",
    tag = "profiles",
    params(("id" = Uuid, Path, description = "Profile id")),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = Envelope<Profile>),
        (status = 404, description = "No such profile", body = Envelope<ErrorDetail>)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<UpdateProfile>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(body) = body?;
    ProfileValidator::validate_update(&body)?;
    if state.store.get_by_id(id).await?.is_none() {
        return Err(not_found());
    }
    let changes = body.changes();
    let profile = state.store.update(id, &changes).await?.ok_or_else(not_found)?;
    tracing::info!(id = %id, fields = changes.len(), "profile updated");
    Ok(success_one_ok("Profile updated!", profile))
}

#[utoipa::path(
    delete,
    path = "/api/v1/profiles/{id}",
    tag = "profiles",
    params(("id" = Uuid, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile deleted", body = Envelope<Deleted>),
        (status = 404, description = "No such profile", body = Envelope<ErrorDetail>)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    if state.store.get_by_id(id).await?.is_none() {
        return Err(not_found());
    }
    if !state.store.delete(id).await? {
        return Err(AppError::Internal("Failed to delete!".into()));
    }
    tracing::info!(id = %id, "profile deleted");
    Ok(success_one_ok("Profile deleted!", Deleted { deleted_id: id }))
}
