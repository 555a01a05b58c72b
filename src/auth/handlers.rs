use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{PublicUser, RegisterRequest, TokenRequest, TokenResponse},
        services,
    },
    error::AppResult,
    extract::{ApiForm, ApiJson},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/token", post(token))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let user = services::register(state.users.as_ref(), &state.hasher, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, form))]
pub async fn token(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let access_token = services::login(
        state.users.as_ref(),
        &state.hasher,
        &state.keys,
        &form.username,
        &form.password,
    )
    .await?;
    Ok(Json(TokenResponse::bearer(access_token)))
}
