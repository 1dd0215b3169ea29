// src/api/http/auth.rs
// Session handling lives in the fronting auth gateway; it injects the
// authenticated user's id as a header. Requests without it are rejected
// before any handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller identity.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match value {
            Some(user_id) => Ok(UserId(user_id.to_string())),
            None => Err(ApiError::unauthorized("Missing user identity")),
        }
    }
}
