use serde::{Deserialize, Serialize};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>, // user email
    pub iat: usize,          // issued at (unix timestamp)
    pub exp: usize,          // expires at (unix timestamp)
}
