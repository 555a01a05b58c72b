use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub fcm_token: String,
    pub device_type: String,
}

#[derive(Debug, Serialize)]
pub struct DeviceRegistered {
    pub message: &'static str,
    pub device_id: Uuid,
}

/// Notification content; `data` values must be strings for FCM.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub token: String,
    #[serde(flatten)]
    pub message: PushMessage,
}

#[derive(Debug, Deserialize)]
pub struct MulticastRequest {
    pub tokens: Vec<String>,
    #[serde(flatten)]
    pub message: PushMessage,
}

#[derive(Debug, Deserialize)]
pub struct WeatherAlertRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
