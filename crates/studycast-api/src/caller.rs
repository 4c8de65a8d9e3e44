//! Caller identity.
//!
//! The API sits behind a gateway that authenticates users and forwards the
//! user id in `X-User-Id`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// Axum extractor for the calling user.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?;

        Ok(Caller {
            user_id: user_id.to_string(),
        })
    }
}
