//! Request validation for profile bodies and query windows.

use crate::error::AppError;
use crate::model::{CreateProfile, ListFilter, ListQuery, SearchQuery, UpdateProfile};
use regex::Regex;
use std::sync::OnceLock;

const FULL_NAME_MIN: usize = 2;
const FULL_NAME_MAX: usize = 100;
const PHONE_MAX: usize = 15;
const LIST_LIMIT_MAX: i64 = 100;
const SEARCH_LIMIT_MAX: i64 = 50;
const SEARCH_TERM_MIN: usize = 2;

fn email_pattern() -> Result<&'static Regex, AppError> {
    static EMAIL: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(
                r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
            )
        })
        .as_ref()
        .map_err(|_| AppError::Validation("invalid pattern for email".into()))
}

pub struct ProfileValidator;

impl ProfileValidator {
    /// Validate a create body. Expects the email to be normalized already.
    pub fn validate_create(body: &CreateProfile) -> Result<(), AppError> {
        validate_full_name(&body.full_name)?;
        validate_email(&body.email)?;
        if let Some(phone) = &body.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }

    /// Validate only the fields present in an update body.
    pub fn validate_update(body: &UpdateProfile) -> Result<(), AppError> {
        if let Some(name) = &body.full_name {
            validate_full_name(name)?;
        }
        if let Some(phone) = &body.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }

    pub fn validate_list(query: &ListQuery) -> Result<ListFilter, AppError> {
        let page = u32::try_from(query.page)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| AppError::Validation("page must be at least 1".into()))?;
        let limit = window_limit(query.limit, LIST_LIMIT_MAX)?;
        Ok(ListFilter {
            page,
            limit,
            is_active: query.is_active,
        })
    }

    /// Returns the validated result limit.
    pub fn validate_search(query: &SearchQuery) -> Result<u32, AppError> {
        if query.q.chars().count() < SEARCH_TERM_MIN {
            return Err(AppError::Validation(format!(
                "q must be at least {} characters",
                SEARCH_TERM_MIN
            )));
        }
        window_limit(query.limit, SEARCH_LIMIT_MAX)
    }
}

fn window_limit(limit: i64, max: i64) -> Result<u32, AppError> {
    if !(1..=max).contains(&limit) {
        return Err(AppError::Validation(format!("limit must be between 1 and {}", max)));
    }
    u32::try_from(limit).map_err(|_| AppError::Validation("limit out of range".into()))
}

fn validate_full_name(name: &str) -> Result<(), AppError> {
    let len = name.chars().count();
    if len < FULL_NAME_MIN {
        return Err(AppError::Validation(format!(
            "full_name must be at least {} characters",
            FULL_NAME_MIN
        )));
    }
    if len > FULL_NAME_MAX {
        return Err(AppError::Validation(format!(
            "full_name must be at most {} characters",
            FULL_NAME_MAX
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if !email_pattern()?.is_match(email) {
        return Err(AppError::Validation("email must be a valid email address".into()));
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), AppError> {
    if phone.chars().count() > PHONE_MAX {
        return Err(AppError::Validation(format!(
            "phone must be at most {} characters",
            PHONE_MAX
        )));
    }
    Ok(())
}
