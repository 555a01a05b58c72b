use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{repo_types::User, services::resolve_current_user};
use crate::{error::AppError, state::AppState};

/// Extracts the bearer token and resolves it to the stored user.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                AppError::Unauthorized
            })?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| {
                warn!("invalid auth scheme");
                AppError::Unauthorized
            })?;

        let user = resolve_current_user(state.users.as_ref(), &state.keys, token.trim()).await?;
        Ok(AuthUser(user))
    }
}
