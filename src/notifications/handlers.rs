use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::ApiJson,
    notifications::{
        dto::{
            DeviceRegistered, MessageResponse, MulticastRequest, PushMessage,
            RegisterDeviceRequest, SendRequest, WeatherAlertRequest,
        },
        services::{send_individually, PushSender},
    },
    state::AppState,
};

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/register-device", post(register_device))
        .route("/notifications/send-notification", post(send_notification))
        .route(
            "/notifications/send-multicast-notification",
            post(send_multicast_notification),
        )
        .route("/notifications/send-weather-alert", post(send_weather_alert))
}

fn sender(state: &AppState) -> AppResult<Arc<dyn PushSender>> {
    state.push.clone().ok_or_else(|| {
        AppError::ServiceUnavailable("Push notifications are not configured".into())
    })
}

#[instrument(skip(state, user, body))]
pub async fn register_device(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<RegisterDeviceRequest>,
) -> AppResult<Json<DeviceRegistered>> {
    if body.fcm_token.trim().is_empty() {
        return Err(AppError::Validation("fcm_token: must not be empty".into()));
    }
    let device = state
        .devices
        .insert(user.id, &body.fcm_token, &body.device_type)
        .await?;
    info!(user_id = %user.id, device_id = %device.id, "device registered");
    Ok(Json(DeviceRegistered {
        message: "Device registered successfully",
        device_id: device.id,
    }))
}

#[instrument(skip(state, _user, body))]
pub async fn send_notification(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiJson(body): ApiJson<SendRequest>,
) -> AppResult<Json<MessageResponse>> {
    let sender = sender(&state)?;
    sender
        .send(&body.token, &body.message)
        .await
        .map_err(|e| {
            warn!(error = %e, "notification failed");
            AppError::Internal(anyhow::anyhow!("Failed to send notification"))
        })?;
    Ok(Json(MessageResponse {
        message: "Notification sent successfully",
    }))
}

#[instrument(skip(state, _user, body))]
pub async fn send_multicast_notification(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiJson(body): ApiJson<MulticastRequest>,
) -> AppResult<Json<MessageResponse>> {
    let sender = sender(&state)?;
    if body.tokens.is_empty() {
        return Err(AppError::Validation("tokens: must not be empty".into()));
    }
    let delivered = send_individually(sender.as_ref(), &body.tokens, &body.message).await?;
    if delivered == 0 {
        return Err(AppError::Internal(anyhow::anyhow!(
            "Failed to send multicast notification"
        )));
    }
    Ok(Json(MessageResponse {
        message: "Multicast notification sent successfully",
    }))
}

#[instrument(skip(state, _user, body))]
pub async fn send_weather_alert(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    ApiJson(body): ApiJson<WeatherAlertRequest>,
) -> AppResult<Json<MessageResponse>> {
    let sender = sender(&state)?;
    let tokens: Vec<String> = state
        .devices
        .list_all()
        .await?
        .into_iter()
        .map(|d| d.fcm_token)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(AppError::NotFound("No registered devices found".into()));
    }

    let mut message = PushMessage {
        title: body.title,
        body: body.body,
        ..Default::default()
    };
    message.data.insert("type".into(), "weather_alert".into());

    let delivered = send_individually(sender.as_ref(), &tokens, &message).await?;
    if delivered == 0 {
        return Err(AppError::Internal(anyhow::anyhow!(
            "Failed to send weather alert"
        )));
    }
    Ok(Json(MessageResponse {
        message: "Weather alert sent successfully",
    }))
}
