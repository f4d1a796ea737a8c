use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::repo_types::PublicUser;
use crate::{error::ServiceError, routes::error::ApiError, state::AppState};

pub const NO_TOKEN: &str = "Not authorized, no token";
pub const TOKEN_FAILED: &str = "Not authorized, token failed";

/// Access guard for protected routes.
///
/// Rejects before the handler body runs when the bearer token is absent or
/// does not verify. A valid token whose user has since disappeared still
/// passes, with `user` left as `None`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub user: Option<PublicUser>,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .filter(|h| h.starts_with("Bearer"))
            .ok_or_else(|| unauthorized(NO_TOKEN))?;

        let token = header.split_whitespace().nth(1).unwrap_or_default();

        let user_id = state.keys.verify(token).map_err(|reason| {
            warn!(%reason, "token rejected");
            unauthorized(TOKEN_FAILED)
        })?;

        let user = state
            .users
            .find_by_id(user_id)
            .await
            .map_err(ServiceError::from)?
            .map(PublicUser::from);

        if user.is_none() {
            warn!(%user_id, "token user no longer exists");
        }

        Ok(AuthUser { user_id, user })
    }
}

fn unauthorized(msg: &str) -> ApiError {
    ApiError::Service(ServiceError::Unauthorized(msg.to_string()))
}
