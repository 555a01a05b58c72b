use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    error::AppResult,
    extract::{ApiPath, ApiQuery},
    state::AppState,
    weather::{
        dto::{CoordinatesParams, WeatherQuery, WeatherSnapshot},
        services::fetch_weather,
    },
};

pub fn weather_routes() -> Router<AppState> {
    Router::new()
        .route("/weather/city/:city", get(by_city))
        .route("/weather/coordinates", get(by_coordinates))
}

async fn run(state: &AppState, query: WeatherQuery) -> AppResult<Json<WeatherSnapshot>> {
    let snapshot = fetch_weather(
        state.weather.as_ref(),
        &state.config.weather.api_key,
        &query,
        Some(state.history.as_ref()),
    )
    .await?;
    Ok(Json(snapshot))
}

#[instrument(skip(state))]
pub async fn by_city(
    State(state): State<AppState>,
    ApiPath(city): ApiPath<String>,
) -> AppResult<Json<WeatherSnapshot>> {
    run(&state, WeatherQuery::city(city)).await
}

#[instrument(skip(state))]
pub async fn by_coordinates(
    State(state): State<AppState>,
    ApiQuery(p): ApiQuery<CoordinatesParams>,
) -> AppResult<Json<WeatherSnapshot>> {
    run(&state, WeatherQuery::coordinates(p.lat, p.lon)).await
}
