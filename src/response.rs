//! Standard response envelope helpers.

use crate::model::{ListFilter, Page};
use axum::{http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

/// `{ success, message, data }` wrapper used by every profile endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

/// List envelope with pagination metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct Paginated<T> {
    pub success: bool,
    pub message: String,
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
}

pub fn success_one<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::CREATED,
        Json(Envelope {
            success: true,
            message: message.into(),
            data: Some(data),
        }),
    )
}

pub fn success_one_ok<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<Envelope<T>>) {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            message: message.into(),
            data: Some(data),
        }),
    )
}

pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<Envelope<Vec<T>>>) {
    let message = found_message(data.len());
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            message,
            data: Some(data),
        }),
    )
}

pub fn paginated<T: Serialize>(page: Page<T>, filter: &ListFilter) -> (StatusCode, Json<Paginated<T>>) {
    (
        StatusCode::OK,
        Json(Paginated {
            success: true,
            message: found_message(page.items.len()),
            data: page.items,
            total: page.total,
            page: filter.page,
            limit: filter.limit,
        }),
    )
}

pub fn error_envelope(message: String, detail: ErrorDetail) -> Envelope<ErrorDetail> {
    Envelope {
        success: false,
        message,
        data: Some(detail),
    }
}

fn found_message(count: usize) -> String {
    format!("Found {} profiles", count)
}
