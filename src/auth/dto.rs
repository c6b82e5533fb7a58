use serde::Deserialize;

// Missing fields deserialize as "" so they fail validation with a 400
// instead of being rejected by the JSON extractor.

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
}

/// Request body for a password change; `password` is the current one.
#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default, rename = "refreshToken")]
    pub refresh_token: String,
}
