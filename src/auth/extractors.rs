use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

use super::dto::{api_error, ApiError};
use super::session::CurrentUser;

/// Reads the user that `require_auth` put into request extensions.
#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to get user info"))
    }
}
