use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::ApiJson,
    locations::dto::{CreatedResponse, SaveLocationRequest, SavedLocation},
    state::AppState,
};

pub fn location_routes() -> Router<AppState> {
    Router::new().route("/locations", get(list_locations).post(save_location))
}

#[instrument(skip(state, user, body))]
pub async fn save_location(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<SaveLocationRequest>,
) -> AppResult<(StatusCode, Json<CreatedResponse>)> {
    let id = state
        .locations
        .insert(user.id, &body.location, body.is_default)
        .await?;
    info!(user_id = %user.id, location_id = %id, "location saved");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

#[instrument(skip(state, user))]
pub async fn list_locations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<SavedLocation>>> {
    let items = state.locations.list_by_user(user.id).await?;
    Ok(Json(items))
}
