use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::weather::dto::Location;

#[derive(Debug, Deserialize)]
pub struct SaveLocationRequest {
    pub location: Location,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedLocation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location: Location,
    pub is_default: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}
