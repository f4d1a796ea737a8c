use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for registration and login. Fields are optional so a
/// missing value is reported as a validation error rather than a parse error.
#[derive(Default, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Returned after register or login. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub token: String,
}
